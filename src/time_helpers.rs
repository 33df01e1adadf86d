use slog::Logger;
use time;

/// Runs a function and logs how long it took under the given logger. Steps
/// all through the codebase are wrapped with this so that slow operations
/// show up in request traces.
#[inline]
pub fn log_timed<T, F>(log: &Logger, f: F) -> T
where
    F: FnOnce(&Logger) -> T,
{
    let start = time::precise_time_ns();
    debug!(log, "Start");
    let res = f(log);
    let elapsed = time::precise_time_ns() - start;
    info!(log, "Finish"; "elapsed" => unit_str(elapsed));
    res
}

/// Renders a nanosecond count as a human-readable string like `1.343ms`.
#[inline]
pub fn unit_str(ns: u64) -> String {
    let (div, unit) = unit(ns);
    format!("{:.*}{}", 3, ((ns as f64) / div), unit).to_owned()
}

//
// Private functions
//

#[inline]
fn unit(ns: u64) -> (f64, &'static str) {
    if ns >= 1_000_000_000 {
        (1_000_000_000_f64, "s")
    } else if ns >= 1_000_000 {
        (1_000_000_f64, "ms")
    } else if ns >= 1_000 {
        (1_000_f64, "µs")
    } else {
        (1_f64, "ns")
    }
}
