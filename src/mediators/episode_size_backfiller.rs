use errors::*;
use http_requester::{HttpRequester, HttpRequesterFactory};
use mediators::common;
use schema;
use time_helpers;

use chan;
use chan::{Receiver, Sender};
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::types::{BigInt, Text};
use hyper::{Method, Request, Uri};
use hyper::header::ContentLength;
use r2d2::Pool;
use r2d2_diesel::ConnectionManager;
use slog::Logger;
use std::str::FromStr;
use std::thread;

/// Walks episodes whose audio size was never recorded (historical uploads,
/// or a media file that was swapped out) and fills in `media_size_bytes` by
/// asking the storage server. A `HEAD` request is tried first; servers that
/// don't answer it usefully get a full `GET` and we take the body's length.
pub struct Mediator {
    // Number of workers to use. Should generally be the size of the thread pool minus one for the
    // control process.
    pub num_workers: u32,

    pub http_requester_factory: Box<HttpRequesterFactory>,
    pub pool:                   Pool<ConnectionManager<PgConnection>>,
}

impl Mediator {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| self.run_inner(log))
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        let mut workers = vec![];

        let num_episodes = {
            let (work_send, work_recv) = chan::sync(WORK_CHANNEL_SIZE);
            for i in 0..self.num_workers {
                let thread_name = common::thread_name(i);
                let log =
                    log.new(o!("thread" => thread_name.clone(), "num_threads" => self.num_workers));
                let pool_clone = self.pool.clone();
                let factory_clone = self.http_requester_factory.clone_box();
                let work_recv_clone = work_recv.clone();

                workers.push(thread::Builder::new()
                    .name(thread_name)
                    .spawn(move || {
                        work(&log, &pool_clone, factory_clone, work_recv_clone);
                    })
                    .chain_err(|| "Failed to spawn thread")?);
            }

            self.page_episodes(log, work_send)?

            // `work_send` is dropped, which unblocks our threads' select, passes them a `None`
            // result, and lets them drop back to main
        };

        // Wait for threads to rejoin
        for worker in workers {
            let _ = worker.join();
        }

        Ok(RunResult { num_episodes })
    }

    //
    // Steps
    //

    fn page_episodes(&mut self, log: &Logger, work_send: Sender<EpisodeTuple>) -> Result<i64> {
        let log = log.new(o!("thread" => "control"));
        time_helpers::log_timed(&log.new(o!("step" => "page_episodes")), |log| {
            let conn = &*(self.pool
                .get()
                .chain_err(|| "Error acquiring connection from connection pool"))?;

            let mut last_id = 0i64;
            let mut num_episodes = 0i64;
            loop {
                let episodes = Self::select_episodes(log, conn, last_id)?;

                // If no results came back, we're done
                if episodes.is_empty() {
                    info!(log, "All episodes consumed -- finishing");
                    break;
                }

                for episode in &episodes {
                    work_send.send(episode.clone());
                }

                last_id = episodes[episodes.len() - 1].id;
                num_episodes += episodes.len() as i64;
            }

            Ok(num_episodes)
        })
    }

    fn select_episodes(
        log: &Logger,
        conn: &PgConnection,
        start_id: i64,
    ) -> Result<Vec<EpisodeTuple>> {
        time_helpers::log_timed(
            &log.new(o!("step" => "select_episodes", "start_id" => start_id)),
            |_log| {
                diesel::sql_query(format!(
                    "
                SELECT id, media_url
                FROM episode
                WHERE id > {}
                    AND media_size_bytes IS NULL
                ORDER BY id
                LIMIT {}",
                    start_id, PAGE_SIZE
                )).load::<EpisodeTuple>(conn)
                    .chain_err(|| "Error loading episodes page")
            },
        )
    }
}

pub struct RunResult {
    pub num_episodes: i64,
}

//
// Private constants
//

const PAGE_SIZE: i64 = 100;

const WORK_CHANNEL_SIZE: usize = 100;

//
// Private types
//

// Exists because `sql_query` doesn't support querying into a tuple, only a
// struct.
#[derive(Clone, Debug, QueryableByName)]
struct EpisodeTuple {
    #[sql_type = "BigInt"]
    id: i64,

    #[sql_type = "Text"]
    media_url: String,
}

//
// Private functions
//

fn discover_size(
    log: &Logger,
    requester: &mut HttpRequester,
    media_url: &str,
) -> Result<i64> {
    let uri =
        Uri::from_str(media_url).chain_err(|| format!("Error parsing media URL: {}", media_url))?;

    let (status, headers, _body, _uri) =
        requester.execute(log, Request::new(Method::Head, uri.clone()))?;
    if status.is_success() {
        if let Some(&ContentLength(len)) = headers.get::<ContentLength>() {
            return Ok(len as i64);
        }
    }

    // Some servers answer HEAD without a length (or not at all), so fetch the
    // whole file and measure it.
    let (status, headers, body, _uri) = requester.execute(log, Request::new(Method::Get, uri))?;
    if !status.is_success() {
        bail!(format!(
            "Bad status fetching media URL {}: {}",
            media_url, status
        ));
    }

    match headers.get::<ContentLength>() {
        Some(&ContentLength(len)) => Ok(len as i64),
        None => Ok(body.len() as i64),
    }
}

fn update_episode_size(conn: &PgConnection, id: i64, size_bytes: i64) -> Result<usize> {
    diesel::update(schema::episode::table)
        .filter(schema::episode::id.eq(id))
        .set(schema::episode::media_size_bytes.eq(Some(size_bytes)))
        .execute(conn)
        .chain_err(|| "Error updating episode size")
}

fn work(
    log: &Logger,
    pool: &Pool<ConnectionManager<PgConnection>>,
    http_requester_factory: Box<HttpRequesterFactory>,
    work_recv: Receiver<EpisodeTuple>,
) {
    let conn = match pool.try_get() {
        Some(conn) => conn,
        None => {
            error!(
                log,
                "Error acquiring connection from connection pool (is num_workers misconfigured?)"
            );
            return;
        }
    };
    debug!(log, "Thread acquired a connection");
    let mut http_requester = http_requester_factory.create();

    loop {
        chan_select! {
            work_recv.recv() -> episode => {
                let episode: EpisodeTuple = match episode {
                    Some(t) => t,
                    None => {
                        debug!(log, "Received empty data over channel -- dropping");
                        break;
                    }
                };

                let log = log.new(o!("episode_id" => episode.id));
                let res = discover_size(&log, &mut *http_requester, episode.media_url.as_str())
                    .and_then(|size_bytes| {
                        info!(log, "Discovered media size"; "size_bytes" => size_bytes);
                        update_episode_size(&*conn, episode.id, size_bytes)
                    });

                if let Err(e) = res {
                    error!(log, "Error backfilling episode: {}", e);
                }
            },
        }
    }
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use http_requester::HttpRequesterFactoryPassThrough;
    use mediators::episode_size_backfiller::*;
    use test_data;
    use test_helpers;

    use r2d2::PooledConnection;
    use std::sync::Arc;

    #[test]
    #[ignore]
    fn test_episode_size_backfill() {
        let mut bootstrap = TestBootstrap::new();

        let podcast = test_data::podcast::insert(&bootstrap.log, &*bootstrap.conn);
        let num_episodes = (test_helpers::NUM_CONNECTIONS as i64) * 5;
        for _i in 0..num_episodes {
            test_data::episode::insert_args(
                &bootstrap.log,
                &*bootstrap.conn,
                test_data::episode::Args {
                    podcast: Some(&podcast),
                },
            );
        }

        debug!(&bootstrap.log, "Finished setup (starting the real test)");

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();
        assert_eq!(num_episodes, res.num_episodes);

        let num_missing: i64 = schema::episode::table
            .filter(schema::episode::media_size_bytes.is_null())
            .count()
            .first(&*bootstrap.conn)
            .unwrap();
        assert_eq!(0, num_missing);

        let sizes: Vec<Option<i64>> = schema::episode::table
            .select(schema::episode::media_size_bytes)
            .distinct()
            .load(&*bootstrap.conn)
            .unwrap();
        assert_eq!(vec![Some(TEST_MEDIA_LEN)], sizes);
    }

    #[test]
    #[ignore]
    fn test_episode_size_backfill_nothing_to_do() {
        let mut bootstrap = TestBootstrap::new();

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();
        assert_eq!(0, res.num_episodes);
    }

    //
    // Private types/functions
    //

    const TEST_MEDIA_LEN: i64 = 1_234;

    struct TestBootstrap {
        conn: PooledConnection<ConnectionManager<PgConnection>>,
        log:  Logger,
        pool: Pool<ConnectionManager<PgConnection>>,
    }

    impl TestBootstrap {
        fn new() -> TestBootstrap {
            let pool = test_helpers::pool();
            let conn = pool.get()
                .expect("Error acquiring connection from connection pool");
            TestBootstrap {
                conn: conn,
                log:  test_helpers::log_sync(),
                pool: pool,
            }
        }

        fn mediator(&mut self) -> (Mediator, Logger) {
            (
                Mediator {
                    // Number of connections minus one for the backfiller's control thread and minus
                    // another one for a connection that a test case might be using for setup.
                    num_workers: test_helpers::NUM_CONNECTIONS - 1 - 1,

                    http_requester_factory: Box::new(HttpRequesterFactoryPassThrough {
                        data: Arc::new(vec![0; TEST_MEDIA_LEN as usize]),
                    }),
                    pool: self.pool.clone(),
                },
                self.log.clone(),
            )
        }
    }

    impl Drop for TestBootstrap {
        fn drop(&mut self) {
            debug!(&self.log, "Cleaning database on bootstrap drop");
            (*self.conn)
                .execute("TRUNCATE TABLE account CASCADE")
                .unwrap();
        }
    }
}
