use super::{slash::SlashMenu, SlashCommand};
use crate::{
    list_position,
    ordering::{self, sort_siblings},
    validate_title, Block, BlockContent, BlockPatch, BlockType, FolioError, FolioResult, Page, TodoItem,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caret {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Focus {
    pub block_id: String,
    pub caret: Caret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Enter,
    Backspace,
    Escape,
    /// `at_edge` is set when the caret sits on the first visual line
    ArrowUp { at_edge: bool },
    /// `at_edge` is set when the caret sits on the last visual line
    ArrowDown { at_edge: bool },
}

/// Work the engine asks its driver to carry out. Local state has already
/// been updated by the time an effect is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Buffer a content write behind the debounce window.
    QueueContent { block_id: String, content: String },
    /// Write the block's buffered content now.
    FlushContent { block_id: String },
    /// Forget the block's buffered content.
    DiscardContent { block_id: String },
    /// Buffer a page title write behind the debounce window.
    QueueTitle { page_id: String, title: String },
    /// Write every buffered value now.
    FlushAll,
    UpdateBlock { block_id: String, patch: BlockPatch },
    /// Create a block right after `after`, or first when `None`. The driver
    /// hands the stored block back through [`EditorEngine::insert_created`].
    CreateBlock {
        after: Option<String>,
        block_type: BlockType,
        sort_position: i64,
    },
    DeleteBlock { block_id: String },
    ReorderBlocks { page_id: String, ordered_ids: Vec<String> },
}

/// Interaction state of one open page: its blocks in display order, the
/// focused block and the slash menu. Every entry point mutates local state
/// synchronously and returns the persistence work as [`Effect`]s.
#[derive(Debug, Clone)]
pub struct EditorEngine {
    page: Page,
    blocks: Vec<Block>,
    focus: Option<Focus>,
    menu: SlashMenu,
}

impl EditorEngine {
    pub fn new(page: Page, mut blocks: Vec<Block>) -> Self {
        blocks.retain(|block| block.page_id == page.id);
        sort_siblings(&mut blocks);
        Self {
            page,
            blocks,
            focus: None,
            menu: SlashMenu::Idle,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    pub fn menu(&self) -> &SlashMenu {
        &self.menu
    }

    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    fn index_of(&self, block_id: &str) -> FolioResult<usize> {
        self.blocks
            .iter()
            .position(|b| b.id == block_id)
            .ok_or_else(|| FolioError::BlockNotFound(block_id.to_owned()))
    }

    fn focused_index(&self) -> Option<usize> {
        let focus = self.focus.as_ref()?;
        self.blocks.iter().position(|b| b.id == focus.block_id)
    }

    /// Display number of a numbered list item, recomputed from its run.
    pub fn numbering(&self, block_id: &str) -> Option<usize> {
        let index = self.index_of(block_id).ok()?;
        (self.blocks[index].block_type == BlockType::NumberedList).then(|| list_position(&self.blocks, index))
    }

    fn order_effect(&self) -> Effect {
        Effect::ReorderBlocks {
            page_id: self.page.id.clone(),
            ordered_ids: self.blocks.iter().map(|b| b.id.clone()).collect(),
        }
    }

    /// Replace local state with a fresh fetch, keeping focus when the block
    /// survived.
    pub fn reload(&mut self, page: Page, blocks: Vec<Block>) {
        let focus = self.focus.take();
        *self = Self::new(page, blocks);
        self.focus = focus.filter(|focus| self.block(&focus.block_id).is_some());
    }

    pub fn focus_block(&mut self, block_id: &str, caret: Caret) -> FolioResult<Vec<Effect>> {
        self.index_of(block_id)?;

        let mut effects = Vec::new();
        match self.focus.take() {
            Some(previous) if previous.block_id == block_id => {}
            Some(previous) => {
                self.menu.dismiss();
                effects.push(Effect::FlushContent {
                    block_id: previous.block_id,
                });
            }
            None => self.menu.dismiss(),
        }
        self.focus = Some(Focus {
            block_id: block_id.to_owned(),
            caret,
        });

        Ok(effects)
    }

    pub fn blur(&mut self) -> Vec<Effect> {
        self.menu.dismiss();
        match self.focus.take() {
            Some(previous) => vec![Effect::FlushContent {
                block_id: previous.block_id,
            }],
            None => Vec::new(),
        }
    }

    /// The block's full content after a keystroke.
    pub fn input(&mut self, block_id: &str, content: &str) -> FolioResult<Vec<Effect>> {
        let index = self.index_of(block_id)?;
        let mut effects = self.focus_block(block_id, Caret::End)?;

        self.blocks[index].set_content(content);
        self.menu.on_input(content);
        effects.push(Effect::QueueContent {
            block_id: block_id.to_owned(),
            content: content.to_owned(),
        });

        Ok(effects)
    }

    /// Structured edit, for toggles and links. The value must be a
    /// decoding of the block's own type.
    pub fn edit_content(&mut self, block_id: &str, content: &BlockContent) -> FolioResult<Vec<Effect>> {
        let block_type = self.blocks[self.index_of(block_id)?].block_type;
        let encoded = content.encode();
        if BlockContent::decode(block_type, &encoded) != *content {
            return Err(FolioError::Validation(format!(
                "content does not fit a {block_type} block"
            )));
        }
        self.input(block_id, &encoded)
    }

    pub fn key(&mut self, key: EditorKey) -> FolioResult<Vec<Effect>> {
        let Some(index) = self.focused_index() else {
            return Ok(Vec::new());
        };

        if self.menu.is_open() {
            return Ok(match key {
                EditorKey::Enter => match self.menu.selected_index() {
                    Some(selected) if selected < self.menu.candidates().len() => {
                        return self.select_command(selected);
                    }
                    _ => {
                        self.menu.dismiss();
                        Vec::new()
                    }
                },
                EditorKey::Escape => {
                    self.menu.dismiss();
                    Vec::new()
                }
                EditorKey::ArrowUp { .. } => {
                    self.menu.move_selection(-1);
                    Vec::new()
                }
                EditorKey::ArrowDown { .. } => {
                    self.menu.move_selection(1);
                    Vec::new()
                }
                EditorKey::Backspace => self.backspace(index),
            });
        }

        match key {
            EditorKey::Enter => self.enter(index),
            EditorKey::Backspace => Ok(self.backspace(index)),
            EditorKey::Escape => Ok(Vec::new()),
            EditorKey::ArrowUp { at_edge } if at_edge && index > 0 => {
                let target = self.blocks[index - 1].id.clone();
                self.focus_block(&target, Caret::End)
            }
            EditorKey::ArrowDown { at_edge } if at_edge && index + 1 < self.blocks.len() => {
                let target = self.blocks[index + 1].id.clone();
                self.focus_block(&target, Caret::Start)
            }
            EditorKey::ArrowUp { .. } | EditorKey::ArrowDown { .. } => Ok(Vec::new()),
        }
    }

    fn enter(&mut self, index: usize) -> FolioResult<Vec<Effect>> {
        let current = &self.blocks[index];
        if current.is_empty() {
            return Ok(Vec::new());
        }

        let placement = ordering::plan_insert_after(&self.blocks, Some(index))?;
        Ok(vec![
            Effect::FlushContent {
                block_id: current.id.clone(),
            },
            Effect::CreateBlock {
                after: Some(current.id.clone()),
                block_type: BlockType::Text,
                sort_position: placement.key,
            },
        ])
    }

    fn backspace(&mut self, index: usize) -> Vec<Effect> {
        if !self.blocks[index].is_empty() {
            return Vec::new();
        }

        self.menu.dismiss();
        let removed = self.blocks.remove(index);
        self.focus = index.checked_sub(1).map(|prev| Focus {
            block_id: self.blocks[prev].id.clone(),
            caret: Caret::End,
        });

        vec![
            Effect::DiscardContent {
                block_id: removed.id.clone(),
            },
            Effect::DeleteBlock { block_id: removed.id },
        ]
    }

    /// Apply a slash menu candidate to the focused block.
    pub fn select_command(&mut self, candidate: usize) -> FolioResult<Vec<Effect>> {
        let candidates = self.menu.candidates();
        let command: &SlashCommand = match candidates.get(candidate) {
            Some(command) => *command,
            None if candidates.is_empty() => {
                self.menu.dismiss();
                return Ok(Vec::new());
            }
            None => {
                return Err(FolioError::PositionOutOfRange {
                    index: candidate,
                    len: candidates.len(),
                })
            }
        };
        let Some(index) = self.focused_index() else {
            self.menu.dismiss();
            return Ok(Vec::new());
        };

        let block = &mut self.blocks[index];
        block.set_type(command.block_type);
        self.menu.dismiss();

        Ok(vec![
            Effect::DiscardContent {
                block_id: block.id.clone(),
            },
            Effect::UpdateBlock {
                block_id: block.id.clone(),
                patch: BlockPatch::retype(command.block_type),
            },
        ])
    }

    /// Append a block after `after`, or at the end of the page.
    pub fn add_block(&mut self, after: Option<&str>, block_type: BlockType) -> FolioResult<Vec<Effect>> {
        let anchor = match after {
            Some(id) => Some(self.index_of(id)?),
            None => self.blocks.len().checked_sub(1),
        };
        let placement = ordering::plan_insert_after(&self.blocks, anchor)?;

        Ok(vec![Effect::CreateBlock {
            after: anchor.map(|i| self.blocks[i].id.clone()),
            block_type,
            sort_position: placement.key,
        }])
    }

    /// Place a block the store just created and focus it. When its neighbours
    /// left no room for its key the page is renumbered and the full order is
    /// sent back.
    pub fn insert_created(&mut self, after: Option<&str>, block: Block) -> FolioResult<Vec<Effect>> {
        let anchor = match after {
            _ if self.blocks.is_empty() => None,
            // the anchor may have been deleted while the create was in flight
            Some(id) => Some(self.index_of(id).unwrap_or(self.blocks.len() - 1)),
            None => None,
        };

        let stored_key = block.sort_order;
        let block_id = block.id.clone();
        let placement = ordering::insert_after(&mut self.blocks, anchor, block)?;

        let mut effects = Vec::new();
        if placement.renumbered || placement.key != stored_key {
            effects.push(self.order_effect());
        }
        effects.extend(self.focus_block(&block_id, Caret::Start)?);

        Ok(effects)
    }

    /// Drag and drop: one reorder call carrying the page's full order.
    pub fn move_block(&mut self, from: usize, to: usize) -> FolioResult<Vec<Effect>> {
        ordering::move_item(&mut self.blocks, from, to)?;
        if from == to {
            return Ok(Vec::new());
        }
        Ok(vec![self.order_effect()])
    }

    /// Checkbox click, written immediately.
    pub fn toggle_todo(&mut self, block_id: &str) -> FolioResult<Vec<Effect>> {
        let index = self.index_of(block_id)?;
        let block = &mut self.blocks[index];
        if block.block_type != BlockType::Todo {
            return Err(FolioError::Validation(format!("block {block_id} is not a todo")));
        }

        let content = TodoItem::decode(&block.content).toggled().encode();
        block.set_content(content.clone());

        Ok(vec![
            Effect::DiscardContent {
                block_id: block_id.to_owned(),
            },
            Effect::UpdateBlock {
                block_id: block_id.to_owned(),
                patch: BlockPatch::content(content),
            },
        ])
    }

    pub fn edit_title(&mut self, title: &str) -> FolioResult<Vec<Effect>> {
        let title = validate_title(title)?;
        self.page.set_title(&title)?;
        Ok(vec![Effect::QueueTitle {
            page_id: self.page.id.clone(),
            title,
        }])
    }

    /// Leaving the page: everything buffered is written now.
    pub fn teardown(&mut self) -> Vec<Effect> {
        self.focus = None;
        self.menu.dismiss();
        vec![Effect::FlushAll]
    }
}
