//! Client for the remote solve-management service.
//!
//! Submits one [`JobRequest`] line over TCP and blocks for one [`JobReply`]
//! line. Both the async and the blocking client enforce explicit connect and
//! reply timeouts; an unreachable service is a typed error, never a hang.

use crate::error::{SolverError, SolverResult};
use crate::outcome::{SolveOptions, SolveOutcome};
use crate::protocol::{JobReply, JobRequest};
use crate::RemoteConfig;
use esv_core::ValuationModel;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

/// Connection establishment budget, separate from the solve budget.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A handle to one remote solve-management endpoint.
pub struct RemoteClient {
    endpoint: String,
    connect_timeout: Duration,
    reply_timeout: Duration,
}

impl RemoteClient {
    /// Client with the default connect budget and a 300 second reply budget.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: CONNECT_TIMEOUT,
            reply_timeout: Duration::from_secs(300),
        }
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit a job and await the reply.
    ///
    /// This method:
    /// 1. Connects to the service under the connect timeout
    /// 2. Writes the request as one JSON line
    /// 3. Reads one JSON reply line under the reply timeout
    pub async fn submit(&self, request: &JobRequest) -> SolverResult<JobReply> {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
        use tokio::net::TcpStream;
        use tokio::time::timeout;

        let connect = timeout(self.connect_timeout, TcpStream::connect(self.endpoint.as_str())).await;
        let stream = match connect {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(SolverError::Unavailable {
                    endpoint: self.endpoint.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(SolverError::Unavailable {
                    endpoint: self.endpoint.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "connection attempt timed out",
                    ),
                })
            }
        };

        let mut line = serde_json::to_string(request)?;
        line.push('\n');

        let (read_half, mut write_half) = stream.into_split();
        write_half
            .write_all(line.as_bytes())
            .await
            .map_err(|e| SolverError::Protocol(format!("failed to submit job: {}", e)))?;

        debug!(endpoint = %self.endpoint, solver = %request.solver, "job submitted");

        let mut reply_line = String::new();
        let mut reader = BufReader::new(read_half);
        let read = timeout(self.reply_timeout, reader.read_line(&mut reply_line)).await;
        match read {
            Ok(Ok(0)) => Err(SolverError::Protocol(
                "service closed the connection without a reply".to_string(),
            )),
            Ok(Ok(_)) => Ok(serde_json::from_str(&reply_line)?),
            Ok(Err(e)) => Err(SolverError::Protocol(format!("failed to read reply: {}", e))),
            Err(_) => Err(SolverError::Timeout {
                seconds: self.reply_timeout.as_secs(),
            }),
        }
    }

    /// Submit a job synchronously (blocking).
    ///
    /// Blocking twin of [`submit`](Self::submit) built on `std::net`, suitable
    /// for the synchronous optimizer lifecycle.
    pub fn submit_blocking(&self, request: &JobRequest) -> SolverResult<JobReply> {
        let addr = self
            .endpoint
            .to_socket_addrs()
            .map_err(|source| SolverError::Unavailable {
                endpoint: self.endpoint.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| {
                SolverError::Protocol(format!("endpoint '{}' did not resolve", self.endpoint))
            })?;

        let mut stream = TcpStream::connect_timeout(&addr, self.connect_timeout).map_err(
            |source| SolverError::Unavailable {
                endpoint: self.endpoint.clone(),
                source,
            },
        )?;
        stream.set_read_timeout(Some(self.reply_timeout))?;
        stream.set_write_timeout(Some(self.connect_timeout))?;

        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        stream
            .write_all(line.as_bytes())
            .map_err(|e| SolverError::Protocol(format!("failed to submit job: {}", e)))?;

        debug!(endpoint = %self.endpoint, solver = %request.solver, "job submitted");

        let mut reply_line = String::new();
        let mut reader = BufReader::new(stream);
        match reader.read_line(&mut reply_line) {
            Ok(0) => Err(SolverError::Protocol(
                "service closed the connection without a reply".to_string(),
            )),
            Ok(_) => Ok(serde_json::from_str(&reply_line)?),
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Err(SolverError::Timeout {
                    seconds: self.reply_timeout.as_secs(),
                })
            }
            Err(e) => Err(SolverError::Io(e)),
        }
    }
}

/// Submit a model to the configured remote service and await completion.
pub fn solve_remote(
    model: &ValuationModel,
    config: &RemoteConfig,
    options: &SolveOptions,
) -> SolverResult<SolveOutcome> {
    let request = JobRequest::new(model, config.job_solver, config.timeout, options.verbose)?;
    let client = RemoteClient::new(config.endpoint.as_str()).with_reply_timeout(config.timeout);

    let reply = client.submit_blocking(&request)?;
    reply.check_protocol()?;
    Ok(reply.into_outcome())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::TerminationStatus;
    use crate::{SolverId, PROTOCOL_VERSION};
    use esv_core::{LinExpr, Relation};
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;

    fn sample_request() -> JobRequest {
        let mut model = ValuationModel::new();
        let x = model.add_variable("x", 0.0, 10.0);
        model.constrain("floor", LinExpr::from(x), Relation::Ge, 1.0);
        model.minimize(LinExpr::from(x));
        JobRequest::new(&model, SolverId::Cbc, Duration::from_secs(5), false).unwrap()
    }

    /// One-shot stub service: accepts a single connection, parses the request
    /// line, replies with a canned optimal solution.
    fn spawn_stub_service() -> (String, std::thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let request: JobRequest = serde_json::from_str(&line).unwrap();

            let reply = JobReply {
                protocol_version: PROTOCOL_VERSION,
                status: TerminationStatus::Optimal,
                objective: 1.0,
                solve_time_ms: 3,
                values: vec![1.0; request.model.num_columns()],
                message: None,
            };
            let mut stream = stream;
            let mut text = serde_json::to_string(&reply).unwrap();
            text.push('\n');
            stream.write_all(text.as_bytes()).unwrap();
        });
        (endpoint, handle)
    }

    #[test]
    fn blocking_round_trip_against_stub_service() {
        let (endpoint, handle) = spawn_stub_service();
        let client = RemoteClient::new(endpoint).with_reply_timeout(Duration::from_secs(5));

        let reply = client.submit_blocking(&sample_request()).unwrap();
        assert_eq!(reply.status, TerminationStatus::Optimal);
        assert_eq!(reply.values, vec![1.0]);
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn async_round_trip_against_stub_service() {
        let (endpoint, handle) = spawn_stub_service();
        let client = RemoteClient::new(endpoint).with_reply_timeout(Duration::from_secs(5));

        let reply = client.submit(&sample_request()).await.unwrap();
        assert_eq!(reply.status, TerminationStatus::Optimal);
        handle.join().unwrap();
    }

    #[test]
    fn unreachable_service_is_a_typed_error_not_a_hang() {
        // Port 1 is essentially never listening; connect must fail fast.
        let client = RemoteClient::new("127.0.0.1:1")
            .with_connect_timeout(Duration::from_millis(500))
            .with_reply_timeout(Duration::from_millis(500));

        match client.submit_blocking(&sample_request()) {
            Err(SolverError::Unavailable { endpoint, .. }) => {
                assert_eq!(endpoint, "127.0.0.1:1");
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[test]
    fn silent_service_times_out() {
        // Accepts the connection but never replies.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(&stream);
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            std::thread::sleep(Duration::from_secs(2));
            drop(stream);
        });

        let client = RemoteClient::new(endpoint).with_reply_timeout(Duration::from_millis(200));
        match client.submit_blocking(&sample_request()) {
            Err(SolverError::Timeout { .. }) => {}
            other => panic!("expected Timeout, got {:?}", other),
        }
        handle.join().unwrap();
    }
}
