// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use codex_engine::export::document_from_markdown;
use codex_engine::model::Node;

#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with **some** content and `code`.\n\n- Bullet point\n  - Nested item\n- Another item\n\n| a | b |\n| --- | --- |\n| 1 | 2 |\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_document(size: usize) -> Node {
    document_from_markdown(&generate_markdown_content(size)).unwrap()
}

/// Positions of the first character of every code block.
#[allow(dead_code)]
pub fn code_block_starts(doc: &Node) -> Vec<usize> {
    let mut starts = Vec::new();
    doc.descendants(&mut |node, pos, _, _| {
        if node.node_type() == codex_engine::schema::NodeType::CodeBlock {
            starts.push(pos + 1);
        }
        true
    });
    starts
}
