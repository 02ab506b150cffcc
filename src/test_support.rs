//! A tiny blocking HTTP stub for exercising the real status client.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

/// A canned reply from the stub
pub struct Reply {
    pub code: u16,
    pub body: String,
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Self { code: 200, body: body.to_owned() }
    }

    pub fn status(code: u16) -> Self {
        Self { code, body: String::new() }
    }
}

/// An HTTP server on an ephemeral local port that answers every request with
/// the reply produced by its handler
///
/// The server thread is detached and lives until the test process exits.
pub struct StubServer {
    base_url: String,
    paths: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn start<F>(handler: F) -> Self
        where F: Fn(&str) -> Reply + Send + 'static
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let paths = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&paths);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let Some(path) = read_request_path(&stream) else { continue };
                let reply = handler(&path);
                seen.lock().unwrap().push(path);
                let _ = write_reply(stream, reply);
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}/v1/accounts/"),
            paths,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The request paths received so far, in arrival order
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

/// A base url nothing is listening on
pub fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/v1/accounts/")
}

fn read_request_path(stream: &TcpStream) -> Option<String> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let path = request_line.split_whitespace().nth(1)?.to_owned();

    // drain the headers, GET requests carry no body
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) if line == "\r\n" || line == "\n" => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    Some(path)
}

fn write_reply(mut stream: TcpStream, reply: Reply) -> std::io::Result<()> {
    let content_type = if reply.code == 200 { "application/json" } else { "text/plain" };
    write!(
        stream,
        "HTTP/1.1 {} STUB\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.code,
        content_type,
        reply.body.len(),
        reply.body,
    )?;
    stream.flush()
}
