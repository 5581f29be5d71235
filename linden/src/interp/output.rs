//! Destination for `print`
//!
//! Enum dispatch: stdout for the CLI, an in-memory buffer for tests and
//! embedding.

/// Where `print` writes its lines
#[derive(Debug, Default)]
pub enum PrintSink {
    #[default]
    Stdout,
    Buffer(String),
}

impl PrintSink {
    pub fn buffer() -> Self {
        PrintSink::Buffer(String::new())
    }

    /// Write one line.
    pub fn println(&mut self, msg: &str) {
        match self {
            PrintSink::Stdout => println!("{msg}"),
            PrintSink::Buffer(buf) => {
                buf.push_str(msg);
                buf.push('\n');
            }
        }
    }

    /// Take everything captured so far. Always empty for stdout.
    pub fn take(&mut self) -> String {
        match self {
            PrintSink::Stdout => String::new(),
            PrintSink::Buffer(buf) => std::mem::take(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_captures_lines() {
        let mut sink = PrintSink::buffer();
        sink.println("one");
        sink.println("two");
        assert_eq!(sink.take(), "one\ntwo\n");
        assert_eq!(sink.take(), "");
    }

    #[test]
    fn test_stdout_captures_nothing() {
        let mut sink = PrintSink::default();
        assert!(matches!(sink, PrintSink::Stdout));
        assert_eq!(sink.take(), "");
    }
}
