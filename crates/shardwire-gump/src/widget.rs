use std::str::FromStr;

use serde::Serialize;

use crate::error::{GumpError, Result};

/// Layout color meaning "use the default text color".
pub const DEFAULT_COLOR_SENTINEL: u32 = 0x7FFF;
/// What [`DEFAULT_COLOR_SENTINEL`] maps to.
pub const DEFAULT_COLOR: u32 = 0x00FF_FFFF;

pub(crate) fn remap_color(color: u32) -> u32 {
    if color == DEFAULT_COLOR_SENTINEL {
        DEFAULT_COLOR
    } else {
        color
    }
}

/// Text shown by an HTML area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum HtmlText {
    /// Entry from the layout's text lines.
    Line { text: String },
    /// Localized string, resolved by the consumer.
    Cliloc { id: u32, args: Option<String> },
}

/// Tooltip attached to a widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    pub cliloc: u32,
    /// Tab-separated arguments.
    pub args: Option<String>,
}

/// One widget description. Coordinates are relative to the layout origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
    Button {
        x: i32,
        y: i32,
        normal: u16,
        pressed: u16,
        /// 0 switches page, 1 replies to the server.
        action: i32,
        param: i32,
        button_id: i32,
    },
    ButtonTileArt {
        x: i32,
        y: i32,
        normal: u16,
        pressed: u16,
        action: i32,
        param: i32,
        button_id: i32,
        tile: u16,
        hue: u16,
        tile_x: i32,
        tile_y: i32,
    },
    CheckerTrans {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    CroppedText {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        hue: u16,
        text: String,
    },
    GumpPic {
        x: i32,
        y: i32,
        graphic: u16,
        hue: u16,
        virtue: bool,
    },
    GumpPicTiled {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        graphic: u16,
    },
    Html {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        text: HtmlText,
        background: bool,
        scrollbar: bool,
        color: u32,
    },
    ResizePic {
        x: i32,
        y: i32,
        graphic: u16,
        width: i32,
        height: i32,
    },
    Label {
        x: i32,
        y: i32,
        hue: u16,
        text: String,
    },
    TextEntry {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        hue: u16,
        entry_id: i32,
        text: String,
        max_len: Option<u32>,
        focused: bool,
    },
    TilePic {
        x: i32,
        y: i32,
        graphic: u16,
        hue: u16,
    },
    Radio {
        x: i32,
        y: i32,
        inactive: u16,
        active: u16,
        checked: bool,
        switch_id: i32,
        group: u32,
    },
    Checkbox {
        x: i32,
        y: i32,
        inactive: u16,
        active: u16,
        checked: bool,
        switch_id: i32,
    },
    PicInPic {
        x: i32,
        y: i32,
        graphic: u16,
        source_x: i32,
        source_y: i32,
        width: i32,
        height: i32,
        hue: u16,
    },
    MapArea {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        map: i32,
        map_x: i32,
        map_y: i32,
        map_end_x: i32,
        map_end_y: i32,
    },
}

impl Widget {
    pub fn kind(&self) -> &'static str {
        match self {
            Widget::Button { .. } => "button",
            Widget::ButtonTileArt { .. } => "buttontileart",
            Widget::CheckerTrans { .. } => "checkertrans",
            Widget::CroppedText { .. } => "croppedtext",
            Widget::GumpPic { .. } => "gumppic",
            Widget::GumpPicTiled { .. } => "gumppictiled",
            Widget::Html { .. } => "html",
            Widget::ResizePic { .. } => "resizepic",
            Widget::Label { .. } => "text",
            Widget::TextEntry { .. } => "textentry",
            Widget::TilePic { .. } => "tilepic",
            Widget::Radio { .. } => "radio",
            Widget::Checkbox { .. } => "checkbox",
            Widget::PicInPic { .. } => "picinpic",
            Widget::MapArea { .. } => "maparea",
        }
    }

    pub fn position(&self) -> (i32, i32) {
        match *self {
            Widget::Button { x, y, .. }
            | Widget::ButtonTileArt { x, y, .. }
            | Widget::CheckerTrans { x, y, .. }
            | Widget::CroppedText { x, y, .. }
            | Widget::GumpPic { x, y, .. }
            | Widget::GumpPicTiled { x, y, .. }
            | Widget::Html { x, y, .. }
            | Widget::ResizePic { x, y, .. }
            | Widget::Label { x, y, .. }
            | Widget::TextEntry { x, y, .. }
            | Widget::TilePic { x, y, .. }
            | Widget::Radio { x, y, .. }
            | Widget::Checkbox { x, y, .. }
            | Widget::PicInPic { x, y, .. }
            | Widget::MapArea { x, y, .. } => (x, y),
        }
    }
}

/// Parameters of one command, with typed access by index.
pub(crate) struct Args<'a> {
    params: &'a [String],
    lines: &'a [String],
}

impl<'a> Args<'a> {
    pub(crate) fn new(params: &'a [String], lines: &'a [String]) -> Self {
        Self { params, lines }
    }

    pub(crate) fn len(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn command(&self) -> &'a str {
        self.params.first().map_or("", String::as_str)
    }

    pub(crate) fn str(&self, index: usize) -> Result<&'a str> {
        self.params
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| GumpError::MissingArgument {
                command: self.command().to_string(),
                index,
            })
    }

    pub(crate) fn int<T: FromStr>(&self, index: usize) -> Result<T> {
        let raw = self.str(index)?;
        parse_int(raw).ok_or_else(|| GumpError::BadArgument {
            command: self.command().to_string(),
            index,
            value: raw.to_string(),
        })
    }

    pub(crate) fn int_or<T: FromStr>(&self, index: usize, default: T) -> Result<T> {
        if index < self.len() {
            self.int(index)
        } else {
            Ok(default)
        }
    }

    /// Cliloc number, with an optional leading `#`.
    pub(crate) fn cliloc(&self, index: usize) -> Result<u32> {
        let raw = self.str(index)?;
        raw.trim_start_matches('#')
            .parse()
            .map_err(|_| GumpError::BadArgument {
                command: self.command().to_string(),
                index,
                value: raw.to_string(),
            })
    }

    /// Text line referenced by the parameter at `index`; out-of-range
    /// references yield an empty string.
    pub(crate) fn line(&self, index: usize) -> Result<String> {
        let line: i64 = self.int(index)?;
        Ok(usize::try_from(line)
            .ok()
            .and_then(|i| self.lines.get(i))
            .cloned()
            .unwrap_or_default())
    }

    /// Parameters from `start` on, `@` markers stripped, tab-joined.
    pub(crate) fn joined_from(&self, start: usize) -> Option<String> {
        let rest = self.params.get(start..).filter(|rest| !rest.is_empty())?;
        let joined = rest.join("\t");
        let joined = joined.trim_matches('@').replace('@', "\t");
        Some(joined)
    }

    /// Value of a `key=value` parameter at or after `start`.
    pub(crate) fn keyed(&self, start: usize, key: &str) -> Option<&'a str> {
        self.params.get(start..)?.iter().find_map(|p| {
            let (k, v) = p.split_once('=')?;
            k.eq_ignore_ascii_case(key).then_some(v)
        })
    }
}

fn parse_int<T: FromStr>(raw: &str) -> Option<T> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        let value = i64::from_str_radix(hex, 16).ok()?;
        return value.to_string().parse().ok();
    }
    raw.parse().ok()
}

pub(crate) fn button(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::Button {
        x: a.int(1)?,
        y: a.int(2)?,
        normal: a.int(3)?,
        pressed: a.int(4)?,
        action: a.int(5)?,
        param: a.int(6)?,
        button_id: a.int(7)?,
    })
}

pub(crate) fn button_tile_art(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::ButtonTileArt {
        x: a.int(1)?,
        y: a.int(2)?,
        normal: a.int(3)?,
        pressed: a.int(4)?,
        action: a.int(5)?,
        param: a.int(6)?,
        button_id: a.int(7)?,
        tile: a.int(8)?,
        hue: a.int(9)?,
        tile_x: a.int(10)?,
        tile_y: a.int(11)?,
    })
}

pub(crate) fn checker_trans(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::CheckerTrans {
        x: a.int(1)?,
        y: a.int(2)?,
        width: a.int(3)?,
        height: a.int(4)?,
    })
}

pub(crate) fn cropped_text(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::CroppedText {
        x: a.int(1)?,
        y: a.int(2)?,
        width: a.int(3)?,
        height: a.int(4)?,
        hue: a.int(5)?,
        text: a.line(6)?,
    })
}

/// `gumppic x y id [hue=N] [class=VirtueGumpItem]`
pub(crate) fn gump_pic(a: &Args<'_>) -> Result<Widget> {
    let hue = match a.keyed(4, "hue") {
        Some(raw) => parse_int(raw).ok_or_else(|| GumpError::BadArgument {
            command: a.command().to_string(),
            index: 4,
            value: raw.to_string(),
        })?,
        None => 0,
    };
    let virtue = a.len() >= 6
        && a.str(5)?
            .to_ascii_lowercase()
            .contains("virtuegumpitem");
    Ok(Widget::GumpPic {
        x: a.int(1)?,
        y: a.int(2)?,
        graphic: a.int(3)?,
        hue,
        virtue,
    })
}

/// `gumppichued x y id [hue]`
pub(crate) fn gump_pic_hued(a: &Args<'_>) -> Result<Widget> {
    let hue = match a.keyed(4, "hue") {
        Some(raw) => parse_int(raw).unwrap_or(0),
        None => a.int_or(4, 0)?,
    };
    Ok(Widget::GumpPic {
        x: a.int(1)?,
        y: a.int(2)?,
        graphic: a.int(3)?,
        hue,
        virtue: false,
    })
}

pub(crate) fn gump_pic_tiled(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::GumpPicTiled {
        x: a.int(1)?,
        y: a.int(2)?,
        width: a.int(3)?,
        height: a.int(4)?,
        graphic: a.int(5)?,
    })
}

/// `htmlgump x y w h line background scrollbar`
pub(crate) fn html(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::Html {
        x: a.int(1)?,
        y: a.int(2)?,
        width: a.int(3)?,
        height: a.int(4)?,
        text: HtmlText::Line { text: a.line(5)? },
        background: a.int::<i32>(6)? == 1,
        scrollbar: a.int::<i32>(7)? != 0,
        color: 0,
    })
}

/// `xmfhtmlgump x y w h cliloc background scrollbar [color]`
pub(crate) fn xmf_html(a: &Args<'_>, with_color: bool) -> Result<Widget> {
    let color = if with_color { remap_color(a.int(8)?) } else { 0 };
    Ok(Widget::Html {
        x: a.int(1)?,
        y: a.int(2)?,
        width: a.int(3)?,
        height: a.int(4)?,
        text: HtmlText::Cliloc {
            id: a.cliloc(5)?,
            args: None,
        },
        background: a.int::<i32>(6)? == 1,
        scrollbar: a.int::<i32>(7)? != 0,
        color,
    })
}

/// `xmfhtmltok x y w h background scrollbar color cliloc args...`
pub(crate) fn xmf_html_tok(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::Html {
        x: a.int(1)?,
        y: a.int(2)?,
        width: a.int(3)?,
        height: a.int(4)?,
        background: a.int::<i32>(5)? == 1,
        scrollbar: a.int::<i32>(6)? != 0,
        color: remap_color(a.int(7)?),
        text: HtmlText::Cliloc {
            id: a.cliloc(8)?,
            args: a.joined_from(9),
        },
    })
}

pub(crate) fn resize_pic(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::ResizePic {
        x: a.int(1)?,
        y: a.int(2)?,
        graphic: a.int(3)?,
        width: a.int(4)?,
        height: a.int(5)?,
    })
}

/// `text x y hue line`
pub(crate) fn label(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::Label {
        x: a.int(1)?,
        y: a.int(2)?,
        hue: a.int(3)?,
        text: a.line(4)?,
    })
}

/// `textentry x y w h hue id line` with a trailing length limit for
/// `textentrylimited`.
pub(crate) fn text_entry(a: &Args<'_>, limited: bool, focused: bool) -> Result<Widget> {
    let max_len = if limited { Some(a.int(8)?) } else { None };
    Ok(Widget::TextEntry {
        x: a.int(1)?,
        y: a.int(2)?,
        width: a.int(3)?,
        height: a.int(4)?,
        hue: a.int(5)?,
        entry_id: a.int(6)?,
        text: a.line(7)?,
        max_len,
        focused,
    })
}

/// `tilepic x y id` / `tilepichue x y id hue`
pub(crate) fn tile_pic(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::TilePic {
        x: a.int(1)?,
        y: a.int(2)?,
        graphic: a.int(3)?,
        hue: a.int_or(4, 0)?,
    })
}

/// `radio x y inactive active checked id`
pub(crate) fn radio(a: &Args<'_>, group: u32) -> Result<Widget> {
    Ok(Widget::Radio {
        x: a.int(1)?,
        y: a.int(2)?,
        inactive: a.int(3)?,
        active: a.int(4)?,
        checked: a.int::<i32>(5)? != 0,
        switch_id: a.int(6)?,
        group,
    })
}

pub(crate) fn checkbox(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::Checkbox {
        x: a.int(1)?,
        y: a.int(2)?,
        inactive: a.int(3)?,
        active: a.int(4)?,
        checked: a.int::<i32>(5)? != 0,
        switch_id: a.int(6)?,
    })
}

/// `picinpic x y id sx sy w h [hue]`
pub(crate) fn pic_in_pic(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::PicInPic {
        x: a.int(1)?,
        y: a.int(2)?,
        graphic: a.int(3)?,
        source_x: a.int(4)?,
        source_y: a.int(5)?,
        width: a.int(6)?,
        height: a.int(7)?,
        hue: a.int_or(8, 0)?,
    })
}

pub(crate) fn map_area(a: &Args<'_>) -> Result<Widget> {
    Ok(Widget::MapArea {
        x: a.int(1)?,
        y: a.int(2)?,
        width: a.int(3)?,
        height: a.int(4)?,
        map: a.int(5)?,
        map_x: a.int(6)?,
        map_y: a.int(7)?,
        map_end_x: a.int(8)?,
        map_end_y: a.int(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(params: &[&str]) -> Vec<String> {
        params.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn hex_and_decimal_ints() {
        let params = owned(&["x", "0x10", "-5", "abc"]);
        let args = Args::new(&params, &[]);
        assert_eq!(args.int::<u16>(1).unwrap(), 16);
        assert_eq!(args.int::<i32>(2).unwrap(), -5);
        assert!(matches!(args.int::<i32>(3), Err(GumpError::BadArgument { index: 3, .. })));
        assert!(matches!(args.int::<i32>(9), Err(GumpError::MissingArgument { index: 9, .. })));
    }

    #[test]
    fn line_out_of_range_is_empty() {
        let params = owned(&["text", "0", "0", "0", "7"]);
        let lines = owned(&["only"]);
        let args = Args::new(&params, &lines);
        assert_eq!(args.line(4).unwrap(), "");
    }

    #[test]
    fn color_sentinel_is_remapped() {
        assert_eq!(remap_color(0x7FFF), 0x00FF_FFFF);
        assert_eq!(remap_color(0x0021), 0x0021);
    }

    #[test]
    fn gump_pic_reads_hue_and_class() {
        let params = owned(&["gumppic", "1", "2", "105", "hue=33", "class=VirtueGumpItem"]);
        let widget = gump_pic(&Args::new(&params, &[])).unwrap();
        assert_eq!(
            widget,
            Widget::GumpPic {
                x: 1,
                y: 2,
                graphic: 105,
                hue: 33,
                virtue: true
            }
        );
    }

    #[test]
    fn xmf_tok_joins_arguments() {
        let params = owned(&[
            "xmfhtmltok", "0", "0", "100", "20", "0", "0", "32767", "1042971", "@5@7@",
        ]);
        let widget = xmf_html_tok(&Args::new(&params, &[])).unwrap();
        match widget {
            Widget::Html { text, color, .. } => {
                assert_eq!(color, DEFAULT_COLOR);
                assert_eq!(
                    text,
                    HtmlText::Cliloc {
                        id: 1_042_971,
                        args: Some("5\t7".into())
                    }
                );
            }
            other => panic!("unexpected widget {other:?}"),
        }
    }
}
