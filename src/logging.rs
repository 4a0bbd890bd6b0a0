//! 把 `tracing` 输出转发到浏览器控制台。

use std::io;

use tracing_subscriber::fmt::MakeWriter;

/// 缓冲一条格式化好的日志，在 drop 时整行写入 `console.log`。
#[derive(Default)]
pub struct ConsoleWriter {
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    fn take_line(&mut self) -> Option<String> {
        let bytes = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&bytes).trim_end().to_string();
        (!line.is_empty()).then_some(line)
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if let Some(line) = self.take_line() {
            web_sys::console::log_1(&line.into());
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::default()
    }
}

/// 安装全局订阅者。重复调用时保留已有的订阅者。
pub fn init(max_level: tracing::Level) {
    let installed = tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_max_level(max_level)
        .try_init();
    if installed.is_ok() {
        tracing::debug!(%max_level, "console logging ready");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn writer_collects_one_trimmed_line() {
        let mut writer = ConsoleMakeWriter.make_writer();
        write!(writer, " DEBUG battle session created mode=classic").expect("buffer write");
        writer.write_all(b"\n").expect("buffer write");

        assert_eq!(
            writer.take_line().as_deref(),
            Some(" DEBUG battle session created mode=classic")
        );
        assert_eq!(writer.take_line(), None);
    }

    #[test]
    fn blank_output_yields_no_line() {
        let mut writer = ConsoleWriter::default();
        writer.write_all(b"  \n").expect("buffer write");
        assert_eq!(writer.take_line(), None);
    }
}
