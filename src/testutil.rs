use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

/// Minimal single-shot HTTP responder bound to a loopback port. Returns the
/// URL to hit; the listener answers exactly one request and exits.
pub(crate) fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("binding loopback listener");
    let addr = listener.local_addr().expect("reading listener address");
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let response = format!(
                "HTTP/1.1 {status_line}\r\n\
                 Content-Type: text/html; charset=utf-8\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\
                 \r\n\
                 {body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}/")
}
