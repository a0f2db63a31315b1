use tokio::sync::broadcast;
use tracing_subscriber::fmt::MakeWriter;

/// Mirrors formatted tracing output into a broadcast channel so an
/// embedding UI can stream developer diagnostics alongside stdout.
#[derive(Clone)]
pub struct StreamMakeWriter {
    pub sender: broadcast::Sender<String>,
    pub suppress_stdout: bool,
}

impl<'a> MakeWriter<'a> for StreamMakeWriter {
    type Writer = StreamWriter;

    fn make_writer(&'a self) -> Self::Writer {
        StreamWriter {
            sender: self.sender.clone(),
            suppress_stdout: self.suppress_stdout,
        }
    }
}

pub struct StreamWriter {
    sender: broadcast::Sender<String>,
    suppress_stdout: bool,
}

impl std::io::Write for StreamWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let msg = String::from_utf8_lossy(buf).to_string();
        let _ = self.sender.send(msg); // Ignored if no receivers
        if !self.suppress_stdout {
            std::io::stdout().write(buf)?;
        }
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        if !self.suppress_stdout {
            std::io::stdout().flush()?;
        }
        Ok(())
    }
}

/// Install the global subscriber and return the sender side of the mirror.
pub fn init(suppress_stdout: bool) -> broadcast::Sender<String> {
    let (sender, _) = broadcast::channel(256);
    let writer = StreamMakeWriter {
        sender: sender.clone(),
        suppress_stdout,
    };
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok();
    sender
}
