use std::io::Write;

use env_logger::fmt::Formatter;

/// 以 Info 级别初始化全局 logger
///
/// 进程内只有第一次调用生效，之后的调用直接忽略
pub fn init_log() {
    init_log_with_filter(log::LevelFilter::Info);
}

/// 以指定级别初始化全局 logger，`RUST_LOG` 环境变量可以覆盖该级别
pub fn init_log_with_filter(filter: log::LevelFilter) {
    let result = env_logger::Builder::new()
        .format(format_record)
        .filter(None, filter)
        .parse_default_env()
        .try_init();

    if result.is_err() {
        log::debug!("logger already initialized");
    }
}

fn format_record(buf: &mut Formatter, record: &log::Record) -> std::io::Result<()> {
    let level_style = match record.level() {
        log::Level::Error => buf
            .default_level_style(log::Level::Error)
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        log::Level::Warn => buf
            .default_level_style(log::Level::Warn)
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        log::Level::Info => buf
            .default_level_style(log::Level::Info)
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        log::Level::Debug => buf
            .default_level_style(log::Level::Debug)
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Cyan))),
        log::Level::Trace => buf.default_level_style(log::Level::Trace),
    };
    let grey_style = anstyle::Style::new().fg_color(Some(anstyle::Color::Rgb(anstyle::RgbColor(110, 110, 110))));
    let body_style = anstyle::Style::new().fg_color(Some(anstyle::Color::Rgb(anstyle::RgbColor(75, 75, 75))));

    // windows 下的路径分隔符同样需要处理
    let file = record.file().unwrap_or("").rsplit(['/', '\\']).next().unwrap_or("");
    let line = record.line().unwrap_or(!0);
    let time = chrono::Local::now().format("%H:%M:%S%.3f");
    let level = record.level();

    writeln!(
        buf,
        "{level_style}[{time}] {level:<5}{level_style:#} {grey_style}[{file}:{line}]{grey_style:#} \
         {body_style}{}{body_style:#}",
        record.args()
    )
}
