// src/logging/runtime_logger.rs

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use serde_json::json;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot;
use tokio::task;
use tokio::time::{self, Duration};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::MakeWriter;

const LEVELS: [&str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
const RETENTION_HOURS: u64 = 72;

/// 单条日志消息
pub struct LogEntry {
    pub level: String,
    pub content: String,
}

enum LogCommand {
    Entry(LogEntry),
    /// 立即刷盘所有缓冲区，完成后回执
    Flush(oneshot::Sender<()>),
}

/// 运行日志管理器（RuntimeLogger）
///
/// 按日志级别分流到不同的按小时滚动文件，后台批量写入，并定期清理过期文件。
pub struct RuntimeLogger {
    sender: Sender<LogCommand>,
}

impl RuntimeLogger {
    /// - `log_dir`: 日志文件存放目录
    /// - `file_prefix`: 文件前缀（最终文件名形如 runtime_info.json）
    /// - `buffer_size`: mpsc 通道缓冲区大小
    /// - `batch_size`: 每个级别累计多少条后写盘
    /// - `flush_interval`: 定时刷盘间隔（毫秒）
    pub fn new(
        log_dir: &str,
        file_prefix: &str,
        buffer_size: usize,
        batch_size: usize,
        flush_interval: u64,
    ) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let log_files: HashMap<String, Arc<RollingFileAppender>> = LEVELS
            .iter()
            .map(|level| {
                let file_name = format!("{}_{}.json", file_prefix, level.to_lowercase());
                (level.to_string(), Arc::new(rolling::hourly(log_dir, file_name)))
            })
            .collect();

        tokio::spawn(Self::background_log_writer(log_files, receiver, batch_size, flush_interval));

        let log_dir = log_dir.to_string();
        tokio::spawn(async move {
            let cleanup_interval = Duration::from_secs(3600);
            loop {
                Self::cleanup_old_logs(&log_dir, RETENTION_HOURS).await;
                time::sleep(cleanup_interval).await;
            }
        });

        Arc::new(Self { sender })
    }

    /// 记录一条运行日志；未知级别归入 INFO
    pub async fn log(&self, level: &str, message: &str) {
        let level = normalize_level(level);
        let content = json!({
            "timestamp": local_timestamp(),
            "level": level,
            "message": message,
        })
        .to_string();

        let entry = LogEntry { level: level.to_string(), content };
        if let Err(e) = self.sender.send(LogCommand::Entry(entry)).await {
            eprintln!("Failed to send runtime log message: {}", e);
        }
    }

    /// 把尚未写盘的日志全部刷出，等待写入完成
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(LogCommand::Flush(ack)).await.is_ok() {
            let _ = done.await;
        }
    }

    async fn background_log_writer(
        log_files: HashMap<String, Arc<RollingFileAppender>>,
        mut receiver: Receiver<LogCommand>,
        batch_size: usize,
        flush_interval: u64,
    ) {
        let mut buffers: HashMap<String, Vec<String>> =
            log_files.keys().map(|level| (level.clone(), Vec::new())).collect();
        let mut interval = time::interval(Duration::from_millis(flush_interval));

        loop {
            tokio::select! {
                command = receiver.recv() => match command {
                    Some(LogCommand::Entry(entry)) => {
                        let buffer = buffers.entry(entry.level.clone()).or_default();
                        buffer.push(entry.content);
                        if buffer.len() >= batch_size {
                            if let Some(appender) = log_files.get(&entry.level) {
                                Self::write_logs_to_disk(appender.clone(), std::mem::take(buffer)).await;
                            }
                        }
                    }
                    Some(LogCommand::Flush(ack)) => {
                        Self::flush_all(&log_files, &mut buffers).await;
                        let _ = ack.send(());
                    }
                    None => {
                        Self::flush_all(&log_files, &mut buffers).await;
                        break;
                    }
                },
                _ = interval.tick() => {
                    Self::flush_all(&log_files, &mut buffers).await;
                }
            }
        }
    }

    async fn flush_all(
        log_files: &HashMap<String, Arc<RollingFileAppender>>,
        buffers: &mut HashMap<String, Vec<String>>,
    ) {
        for (level, buffer) in buffers.iter_mut() {
            if buffer.is_empty() {
                continue;
            }
            if let Some(appender) = log_files.get(level) {
                Self::write_logs_to_disk(appender.clone(), std::mem::take(buffer)).await;
            }
        }
    }

    async fn write_logs_to_disk(file: Arc<RollingFileAppender>, lines: Vec<String>) {
        let content = lines.join("\n") + "\n";
        let written = task::spawn_blocking(move || {
            let mut writer = file.make_writer();
            writer.write_all(content.as_bytes())
        })
        .await;

        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => eprintln!("Failed to write runtime logs: {}", e),
            Err(e) => eprintln!("Runtime log writer task failed: {}", e),
        }
    }

    async fn cleanup_old_logs(log_dir: &str, retention_hours: u64) {
        use std::time::{Duration as StdDuration, SystemTime};

        let retention = StdDuration::from_secs(retention_hours * 3600);
        let now = SystemTime::now();
        let mut dir = match tokio::fs::read_dir(log_dir).await {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Failed to read log directory {}: {}", log_dir, e);
                return;
            }
        };

        while let Ok(Some(entry)) = dir.next_entry().await {
            let path = entry.path();
            let Ok(metadata) = entry.metadata().await else { continue };
            let Ok(modified) = metadata.modified() else { continue };
            if now.duration_since(modified).unwrap_or_default() > retention {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    eprintln!("Failed to delete old log file {:?}: {}", path, e);
                }
            }
        }
    }
}

/// 日志统一使用 UTC+8 的 RFC 3339 时间戳
pub(crate) fn local_timestamp() -> String {
    let tz = FixedOffset::east_opt(8 * 3600).unwrap_or_else(|| Utc.fix());
    Utc::now().with_timezone(&tz).to_rfc3339()
}

fn normalize_level(level: &str) -> &'static str {
    let upper = level.to_ascii_uppercase();
    LEVELS
        .iter()
        .copied()
        .find(|known| *known == upper)
        .unwrap_or("INFO")
}
