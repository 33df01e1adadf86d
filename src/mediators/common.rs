/// Names a worker thread for use in logging contexts.
pub fn thread_name(n: u32) -> String {
    format!("worker_{:03}", n)
}

#[cfg(test)]
mod tests {
    use mediators::common::*;

    #[test]
    fn test_thread_name() {
        assert_eq!("worker_000", thread_name(0));
        assert_eq!("worker_012", thread_name(12));
    }
}
