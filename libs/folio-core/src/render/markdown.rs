use super::safe_url;
use crate::{
    constants::render::{LINK_SCHEMES, MEDIA_SCHEMES},
    list_position,
    ordering::sort_siblings,
    warn, Block, BlockContent, BlockType,
};

fn is_list(block_type: BlockType) -> bool {
    matches!(
        block_type,
        BlockType::BulletList | BlockType::NumberedList | BlockType::Todo
    )
}

fn quoted(text: &str) -> String {
    text.lines().map(|line| format!("> {line}")).collect::<Vec<_>>().join("\n")
}

fn block_to_markdown(blocks: &[Block], index: usize) -> Option<String> {
    let block = &blocks[index];

    match block.decode() {
        BlockContent::Plain(text) => Some(match block.block_type {
            BlockType::Heading1 | BlockType::Heading2 | BlockType::Heading3 => {
                let level = block.block_type.heading_level().unwrap_or(1) as usize;
                format!("{} {text}", "#".repeat(level))
            }
            BlockType::Quote | BlockType::Callout => quoted(&text),
            BlockType::Code => format!("```\n{text}\n```"),
            BlockType::BulletList => format!("- {text}"),
            BlockType::NumberedList => format!("{}. {text}", list_position(blocks, index)),
            _ => text,
        }),
        BlockContent::Todo(todo) => Some(format!("- [{}] {}", if todo.checked { "x" } else { " " }, todo.text)),
        BlockContent::Toggle(toggle) => Some(format!(
            "<details>\n<summary>{}</summary>\n\n{}\n</details>",
            toggle.title, toggle.body
        )),
        BlockContent::Link(link) => match safe_url(&link.url, &LINK_SCHEMES) {
            Some(url) => Some(format!("[{}]({url})", link.display_label())),
            None => Some(link.display_label().to_owned()),
        },
        BlockContent::Media(source) => match safe_url(&source, &MEDIA_SCHEMES) {
            Some(url) if block.block_type == BlockType::Video => Some(format!("[video]({url})")),
            Some(url) => Some(format!("![]({url})")),
            None => {
                warn!("skipping {} block {} without a usable url", block.block_type, block.id);
                None
            }
        },
        BlockContent::Divider => Some("---".into()),
    }
}

/// Markdown export of a block list. List items of one run sit on adjacent
/// lines, everything else is separated by a blank line.
pub fn to_markdown(blocks: &[Block]) -> String {
    let mut blocks = blocks.to_vec();
    sort_siblings(&mut blocks);

    let mut markdown = String::new();
    let mut previous: Option<BlockType> = None;
    for (index, block) in blocks.iter().enumerate() {
        let current = block.block_type;
        if let Some(chunk) = block_to_markdown(&blocks, index) {
            if !markdown.is_empty() {
                let same_list = previous == Some(current) && is_list(current);
                markdown.push_str(if same_list { "\n" } else { "\n\n" });
            }
            markdown.push_str(&chunk);
        }
        // a skipped block still breaks the run
        previous = Some(current);
    }
    if !markdown.is_empty() {
        markdown.push('\n');
    }

    markdown
}
