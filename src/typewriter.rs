//! Character-by-character answer streaming for the front ends.

use std::io::Write;
use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};

/// Yield `text` one character at a time, sleeping `delay` before each.
pub fn chars(text: &str, delay: Duration) -> impl Stream<Item = String> + Send + 'static {
    let chars: Vec<char> = text.chars().collect();

    stream::iter(chars).then(move |c| async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        c.to_string()
    })
}

/// Type `text` into `out`, flushing after every character, then end the line.
pub async fn type_out<W: Write>(text: &str, delay: Duration, out: &mut W) -> std::io::Result<()> {
    let mut stream = Box::pin(chars(text, delay));
    while let Some(c) = stream.next().await {
        out.write_all(c.as_bytes())?;
        out.flush()?;
    }
    writeln!(out)?;
    out.flush()
}
