use serde::Serialize;
use shardwire_frame::{PacketReader, ScratchBuffer};

use crate::compressed::{inflate_into, parse_lines};
use crate::config::LayoutConfig;
use crate::error::{GumpError, Result};
use crate::tokenizer::{Tokenizer, TERMINATOR};
use crate::widget::{self, Args, Tooltip, Widget};

/// Fixed fields that open every layout message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayoutHeader {
    pub sender: u32,
    pub gump_id: u32,
    pub x: i32,
    pub y: i32,
}

impl LayoutHeader {
    pub fn read(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            sender: reader.read_u32_be()?,
            gump_id: reader.read_u32_be()?,
            x: reader.read_i32_be()?,
            y: reader.read_i32_be()?,
        })
    }
}

/// Window-level switches set by bare commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayoutFlags {
    pub no_close: bool,
    pub no_dispose: bool,
    pub no_move: bool,
    pub no_resize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedWidget {
    pub page: u32,
    #[serde(flatten)]
    pub widget: Widget,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tooltips: Vec<Tooltip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_property: Option<u32>,
}

/// Decoded layout: ordered widgets with their pages plus window state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutTree {
    pub sender: u32,
    pub gump_id: u32,
    pub x: i32,
    pub y: i32,
    pub widgets: Vec<PlacedWidget>,
    pub lines: Vec<String>,
    pub flags: LayoutFlags,
    pub master_gump: Option<u32>,
    /// Serials referenced by `itemproperty`, in layout order.
    pub item_properties: Vec<u32>,
    /// Commands skipped as unknown or malformed.
    pub skipped: usize,
}

impl LayoutTree {
    pub fn header(&self) -> LayoutHeader {
        LayoutHeader {
            sender: self.sender,
            gump_id: self.gump_id,
            x: self.x,
            y: self.y,
        }
    }

    pub fn on_page(&self, page: u32) -> impl Iterator<Item = &PlacedWidget> {
        self.widgets.iter().filter(move |w| w.page == page)
    }
}

/// Decodes layout messages. Owns its tokenizer and inflate buffers so they
/// are reused across messages.
#[derive(Debug)]
pub struct LayoutDecoder {
    config: LayoutConfig,
    tokenizer: Tokenizer,
    commands: Vec<String>,
    params: Vec<String>,
    scratch: ScratchBuffer,
}

impl LayoutDecoder {
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            config,
            tokenizer: Tokenizer::new(),
            commands: Vec::new(),
            params: Vec::new(),
            scratch: ScratchBuffer::new(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Decode a compressed layout message body (reader positioned after
    /// the frame header).
    pub fn decode_compressed(&mut self, reader: &mut PacketReader<'_>) -> Result<LayoutTree> {
        let header = LayoutHeader::read(reader)?;
        let layout = String::from_utf8_lossy(self.inflate_block(reader, header, "layout")?)
            .into_owned();

        let line_count = reader.read_u32_be()? as usize;
        if line_count > self.config.max_lines {
            return Err(malformed(header, format!("{line_count} lines")));
        }
        let lines = if line_count != 0 {
            parse_lines(self.inflate_block(reader, header, "lines")?, line_count)
        } else {
            Vec::new()
        };

        Ok(self.build(header, &layout, lines))
    }

    /// Decode an uncompressed layout message body.
    pub fn decode_text(&mut self, reader: &mut PacketReader<'_>) -> Result<LayoutTree> {
        let header = LayoutHeader::read(reader)?;
        let layout_len = reader.read_u16_be()? as usize;
        let layout = reader.read_ascii(layout_len)?;

        let line_count = reader.read_u16_be()? as usize;
        if line_count > self.config.max_lines {
            return Err(malformed(header, format!("{line_count} lines")));
        }
        let mut lines = Vec::with_capacity(line_count);
        for _ in 0..line_count {
            let chars = reader.read_u16_be()? as usize;
            lines.push(reader.read_unicode_be(chars)?);
        }

        Ok(self.build(header, &layout, lines))
    }

    /// Build a tree from layout text and its lines.
    ///
    /// Unknown commands and commands with bad arguments are logged and
    /// skipped; a NUL terminator ends processing.
    pub fn build(&mut self, header: LayoutHeader, layout: &str, lines: Vec<String>) -> LayoutTree {
        let mut tree = LayoutTree {
            sender: header.sender,
            gump_id: header.gump_id,
            x: header.x,
            y: header.y,
            ..LayoutTree::default()
        };

        let mut commands = std::mem::take(&mut self.commands);
        let mut params = std::mem::take(&mut self.params);
        self.tokenizer.commands(layout, &mut commands);

        let mut state = BuildState::default();
        for command in &commands {
            if command == TERMINATOR {
                break;
            }
            self.tokenizer.params(command, &mut params);
            if params.is_empty() {
                continue;
            }
            let entry = params[0].to_ascii_lowercase();
            let args = Args::new(&params, &lines);
            if let Err(e) = state.apply(&mut tree, &entry, &args) {
                tracing::warn!(
                    gump_id = tree.gump_id,
                    command = %entry,
                    error = %e,
                    "skipping layout command"
                );
                tree.skipped += 1;
            }
        }

        self.commands = commands;
        self.params = params;
        tree.lines = lines;
        tree
    }

    /// Read one `{compressed len + 4, decompressed len, zlib bytes}` block
    /// and inflate it into the scratch buffer.
    fn inflate_block(
        &mut self,
        reader: &mut PacketReader<'_>,
        header: LayoutHeader,
        what: &str,
    ) -> Result<&[u8]> {
        let compressed_len = reader
            .read_u32_be()?
            .checked_sub(4)
            .ok_or_else(|| malformed(header, format!("{what} block length")))?
            as usize;
        let decompressed_len = reader.read_u32_be()? as usize;
        if decompressed_len < 1 || decompressed_len > self.config.max_decompressed_len {
            return Err(malformed(
                header,
                format!("{what} decompressed length {decompressed_len}"),
            ));
        }
        let packed = reader.read_bytes(compressed_len)?;
        let out = self.scratch.frame_mut(decompressed_len);
        inflate_into(packed, out).map_err(|source| GumpError::Decompression {
            sender: header.sender,
            gump_id: header.gump_id,
            source,
        })?;
        Ok(self.scratch.frame(decompressed_len))
    }
}

impl Default for LayoutDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn malformed(header: LayoutHeader, reason: String) -> GumpError {
    GumpError::MalformedLayout {
        sender: header.sender,
        gump_id: header.gump_id,
        reason,
    }
}

#[derive(Debug, Default)]
struct BuildState {
    page: u32,
    group: u32,
    focused: bool,
}

impl BuildState {
    fn apply(&mut self, tree: &mut LayoutTree, entry: &str, a: &Args<'_>) -> Result<()> {
        let page = self.page;
        let widget = match entry {
            "button" => widget::button(a)?,
            "buttontileart" => widget::button_tile_art(a)?,
            "checkertrans" => widget::checker_trans(a)?,
            "croppedtext" => widget::cropped_text(a)?,
            "gumppic" | "tilepicasgumppic" => widget::gump_pic(a)?,
            "gumppictiled" => widget::gump_pic_tiled(a)?,
            "htmlgump" => widget::html(a)?,
            "xmfhtmlgump" => widget::xmf_html(a, false)?,
            "xmfhtmlgumpcolor" => widget::xmf_html(a, true)?,
            "xmfhtmltok" => widget::xmf_html_tok(a)?,
            "resizepic" => widget::resize_pic(a)?,
            "text" => {
                if a.len() < 5 {
                    return Ok(());
                }
                widget::label(a)?
            }
            "textentry" | "textentrylimited" => {
                let w = widget::text_entry(a, entry == "textentrylimited", !self.focused)?;
                self.focused = true;
                w
            }
            "tilepic" | "tilepichue" => widget::tile_pic(a)?,
            "radio" => widget::radio(a, self.group)?,
            "checkbox" => widget::checkbox(a)?,
            "picinpic" | "picinpichued" | "picinpicphued" => {
                if a.len() <= 7 {
                    return Ok(());
                }
                widget::pic_in_pic(a)?
            }
            "gumppichued" | "gumppicphued" => {
                if a.len() < 3 {
                    return Ok(());
                }
                push(tree, 0, widget::gump_pic_hued(a)?);
                return Ok(());
            }
            "maparea" => {
                if a.len() < 10 {
                    return Ok(());
                }
                widget::map_area(a)?
            }
            "page" => {
                if a.len() >= 2 {
                    self.page = a.int(1)?;
                }
                return Ok(());
            }
            "group" | "endgroup" => {
                self.group += 1;
                return Ok(());
            }
            "noclose" => {
                tree.flags.no_close = true;
                return Ok(());
            }
            "nodispose" => {
                tree.flags.no_dispose = true;
                return Ok(());
            }
            "nomove" => {
                tree.flags.no_move = true;
                return Ok(());
            }
            "noresize" => {
                tree.flags.no_resize = true;
                return Ok(());
            }
            "mastergump" => {
                tree.master_gump = Some(a.int(1)?);
                return Ok(());
            }
            "tooltip" => {
                let tooltip = Tooltip {
                    cliloc: a.cliloc(1)?,
                    args: if a.len() > 2 && !a.str(2)?.is_empty() {
                        a.joined_from(2)
                    } else {
                        None
                    },
                };
                match tree.widgets.last_mut() {
                    Some(last) => last.tooltips.push(tooltip),
                    None => tracing::debug!(cliloc = tooltip.cliloc, "tooltip before any widget"),
                }
                return Ok(());
            }
            "itemproperty" => {
                let serial: u32 = a.int(1)?;
                if let Some(last) = tree.widgets.last_mut() {
                    last.item_property = Some(serial);
                }
                tree.item_properties.push(serial);
                return Ok(());
            }
            "togglelimitgumpscale" => return Ok(()),
            _ => {
                tracing::warn!(command = %a.command(), "unknown layout command");
                tree.skipped += 1;
                return Ok(());
            }
        };
        push(tree, page, widget);
        Ok(())
    }
}

fn push(tree: &mut LayoutTree, page: u32, widget: Widget) {
    tree.widgets.push(PlacedWidget {
        page,
        widget,
        tooltips: Vec::new(),
        item_property: None,
    });
}
