//! Connected display discovery

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::{process::run_command, DisplayProvider};

/// One connected monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub primary: bool,
}

impl DisplayInfo {
    pub fn new(id: impl Into<String>, width: u32, height: u32, x: i32, y: i32, primary: bool) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            x,
            y,
            primary,
        }
    }

    /// Used when nothing could be discovered
    pub fn fallback() -> Self {
        Self::new("primary", 0, 0, 0, 0, true)
    }
}

/// A fixed display list
#[derive(Debug, Clone)]
pub struct StaticDisplays(pub Vec<DisplayInfo>);

impl DisplayProvider for StaticDisplays {
    fn displays(&self) -> Vec<DisplayInfo> {
        if self.0.is_empty() {
            vec![DisplayInfo::fallback()]
        } else {
            self.0.clone()
        }
    }
}

/// Reads the latest list published by the display probe task
#[derive(Debug, Clone)]
pub struct WatchedDisplays {
    rx: watch::Receiver<Vec<DisplayInfo>>,
}

impl WatchedDisplays {
    pub fn new(rx: watch::Receiver<Vec<DisplayInfo>>) -> Self {
        Self { rx }
    }
}

impl DisplayProvider for WatchedDisplays {
    fn displays(&self) -> Vec<DisplayInfo> {
        let current = self.rx.borrow().clone();
        if current.is_empty() {
            vec![DisplayInfo::fallback()]
        } else {
            current
        }
    }
}

/// Query `xrandr --listmonitors`
pub async fn list_monitors() -> Result<Vec<DisplayInfo>, String> {
    let stdout = run_command("xrandr", &["--listmonitors"]).await?;
    Ok(parse_xrandr_monitors(&stdout))
}

/// Parse lines such as ` 0: +*eDP-1 1920/344x1080/193+0+0  eDP-1`
pub fn parse_xrandr_monitors(output: &str) -> Vec<DisplayInfo> {
    output.lines().filter_map(parse_monitor_line).collect()
}

fn parse_monitor_line(line: &str) -> Option<DisplayInfo> {
    let mut fields = line.split_whitespace();
    let index = fields.next()?;
    if !index.ends_with(':') || index.trim_end_matches(':').parse::<u32>().is_err() {
        return None;
    }

    let flags_and_name = fields.next()?;
    let primary = flags_and_name.contains('*');
    let id = flags_and_name.trim_start_matches(['+', '*']).to_string();

    // WIDTH/mmWxHEIGHT/mmH+X+Y
    let geometry = fields.next()?;
    let (width_part, rest) = geometry.split_once('x')?;
    let width = width_part.split('/').next()?.parse().ok()?;
    let mut offsets = rest.split('+');
    let height = offsets.next()?.split('/').next()?.parse().ok()?;
    let x = offsets.next()?.parse().ok()?;
    let y = offsets.next()?.parse().ok()?;

    Some(DisplayInfo::new(id, width, height, x, y, primary))
}
