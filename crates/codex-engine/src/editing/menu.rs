//! Toolbar and menu model.
//!
//! The menu is plain data: every item names the command it runs, and its
//! enabled/active/visible flags are recomputed from the editor state on
//! demand. Nothing is cached between states.

use super::blocks::{BlockKind, ListKind};
use super::commands::Cmd;
use super::marks::mark_active;
use crate::model::{Align, Mark};
use crate::schema::MarkType;
use crate::state::EditorState;

/// Languages offered for code blocks, as `(params, display name)`.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("arduino", "Arduino (C++)"),
    ("arm", "ARM Assembly"),
    ("bat", "Batch/DOS"),
    ("coffeescript", "CoffeeScript"),
    ("cmake", "CMake"),
    ("cs", "C#"),
    ("cpp", "C++"),
    ("c", "C"),
    ("css", "CSS"),
    ("go", "Go"),
    ("gradle", "Gradle"),
    ("groovy", "Groovy"),
    ("html", "HTML"),
    ("http", "HTTP"),
    ("java", "Java"),
    ("js", "JavaScript"),
    ("json", "JSON"),
    ("tex", "LaTeX"),
    ("less", "Less"),
    ("lisp", "Lisp"),
    ("lua", "Lua"),
    ("makefile", "Makefile"),
    ("markdown", "Markdown"),
    ("mathematica", "Mathematica"),
    ("matlab", "Matlab"),
    ("nim", "Nim"),
    ("objectivec", "Objective C"),
    ("ocaml", "OCaml"),
    ("glsl", "GLSL"),
    ("perl", "Perl"),
    ("php", "PHP"),
    ("ps", "PowerShell"),
    ("py", "Python"),
    ("r", "R"),
    ("ruby", "Ruby"),
    ("rust", "Rust"),
    ("sql", "SQL"),
    ("shell", "Shell"),
    ("swift", "Swift"),
    ("ts", "TypeScript"),
    ("x86asm", "x86 Assembly"),
    ("yml", "YAML"),
];

/// Display name for a code block's `params`, if it is a known language.
pub fn language_name(params: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(key, _)| *key == params)
        .map(|(_, name)| *name)
}

/// Items that need input from the user before they can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Link target and optional title.
    Link,
    /// Image source with optional alt text and title.
    Image,
    /// Row and column counts.
    Table,
}

impl Prompt {
    /// Field labels, in the order `command` expects the values.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Prompt::Link => &["Link target", "Title"],
            Prompt::Image => &["Location", "Description", "Title"],
            Prompt::Table => &["Rows", "Columns"],
        }
    }

    /// Build the command from the filled-in fields. Empty optional fields are
    /// left unset; a missing or invalid required field gives `None`.
    pub fn command(self, values: &[&str]) -> Option<Cmd> {
        let field = |i: usize| {
            values
                .get(i)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        match self {
            Prompt::Link => Some(Cmd::ToggleMark {
                mark: Mark::Link {
                    href: field(0)?,
                    title: field(1),
                },
            }),
            Prompt::Image => Some(Cmd::InsertImage {
                src: field(0)?,
                alt: field(1),
                title: field(2),
            }),
            Prompt::Table => Some(Cmd::InsertTable {
                rows: field(0)?.parse().ok().filter(|n| *n > 0)?,
                cols: field(1)?.parse().ok().filter(|n| *n > 0)?,
            }),
        }
    }

    /// A representative command used to decide whether the item is enabled.
    fn probe(self) -> Cmd {
        match self {
            Prompt::Link => Cmd::ToggleMark {
                mark: Mark::link("#"),
            },
            Prompt::Image => Cmd::InsertImage {
                src: "#".to_string(),
                alt: None,
                title: None,
            },
            Prompt::Table => Cmd::InsertTable { rows: 1, cols: 1 },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    Run(Cmd),
    Prompt(Prompt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    /// Tooltip text.
    pub title: String,
    pub label: Option<String>,
    pub icon: Option<&'static str>,
    pub action: MenuAction,
    /// Hide instead of disabling when the action does not apply.
    pub hide_when_unavailable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemState {
    pub enabled: bool,
    pub active: bool,
    pub visible: bool,
}

impl MenuItem {
    fn run(title: impl Into<String>, cmd: Cmd) -> Self {
        Self {
            title: title.into(),
            label: None,
            icon: None,
            action: MenuAction::Run(cmd),
            hide_when_unavailable: false,
        }
    }

    fn prompt(title: impl Into<String>, prompt: Prompt) -> Self {
        Self {
            title: title.into(),
            label: None,
            icon: None,
            action: MenuAction::Prompt(prompt),
            hide_when_unavailable: false,
        }
    }

    fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    fn hidden_when_unavailable(mut self) -> Self {
        self.hide_when_unavailable = true;
        self
    }

    pub fn state(&self, state: &EditorState) -> ItemState {
        let (enabled, active) = match &self.action {
            MenuAction::Run(cmd) => (cmd.can_apply(state), cmd.is_active(state)),
            MenuAction::Prompt(Prompt::Link) => (
                !state.selection().empty() && Prompt::Link.probe().can_apply(state),
                mark_active(state, MarkType::Link),
            ),
            MenuAction::Prompt(prompt) => (prompt.probe().can_apply(state), false),
        };
        ItemState {
            enabled,
            active,
            visible: enabled || !self.hide_when_unavailable,
        }
    }

    /// The command to run on click, or `None` when the item needs a prompt.
    ///
    /// The link item removes an existing link without prompting.
    pub fn command(&self, state: &EditorState) -> Option<Cmd> {
        match &self.action {
            MenuAction::Run(cmd) => Some(cmd.clone()),
            MenuAction::Prompt(Prompt::Link) if mark_active(state, MarkType::Link) => {
                Some(Prompt::Link.probe())
            }
            MenuAction::Prompt(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuElement {
    Item(MenuItem),
    Dropdown {
        label: String,
        children: Vec<MenuElement>,
    },
    Submenu {
        label: String,
        children: Vec<MenuElement>,
    },
}

impl MenuElement {
    /// Every item in this element, depth first.
    pub fn items(&self) -> Vec<&MenuItem> {
        match self {
            MenuElement::Item(item) => vec![item],
            MenuElement::Dropdown { children, .. } | MenuElement::Submenu { children, .. } => {
                children.iter().flat_map(MenuElement::items).collect()
            }
        }
    }

    /// Dropdowns and submenus are enabled while any item inside them is.
    pub fn enabled(&self, state: &EditorState) -> bool {
        self.items().iter().any(|item| item.state(state).enabled)
    }
}

pub type MenuGroup = Vec<MenuElement>;

fn code_item(language: &str, name: &str) -> MenuElement {
    MenuElement::Item(
        MenuItem::run(
            format!("Change to {name} code block"),
            Cmd::MakeCodeBlock {
                language: language.to_string(),
            },
        )
        .label(name),
    )
}

/// Language submenus split by the first letter of the display name, each
/// ending with the plain code block.
fn code_submenus() -> Vec<MenuElement> {
    let ranges = [("Code (A-G)", 'a'..='g'), ("Code (H-M)", 'h'..='m'), ("Code (N-Z)", 'n'..='z')];
    ranges
        .into_iter()
        .enumerate()
        .map(|(i, (label, letters))| {
            let mut children: Vec<MenuElement> = LANGUAGES
                .iter()
                .filter(|(_, name)| {
                    let first = name.chars().next().map(|c| c.to_ascii_lowercase());
                    match first {
                        Some(c) if c.is_ascii_alphabetic() => letters.contains(&c),
                        // names starting with a digit or symbol go in the first menu
                        _ => i == 0,
                    }
                })
                .map(|(key, name)| code_item(key, name))
                .collect();
            children.push(code_item("", "Other"));
            MenuElement::Submenu {
                label: label.to_string(),
                children,
            }
        })
        .collect()
}

/// The editor toolbar: groups of items separated in the UI.
pub fn build_menu(tab_size: usize) -> Vec<MenuGroup> {
    use MenuElement::Item;

    let mark = |title: &str, icon: &'static str, mark: Mark| {
        Item(MenuItem::run(title, Cmd::ToggleMark { mark }).icon(icon))
    };
    let align = |side: &str, icon: &'static str, align: Align| {
        Item(MenuItem::run(format!("Align text to {side}"), Cmd::Align { align }).icon(icon))
    };
    let headings = (1..=6u8)
        .map(|level| {
            Item(
                MenuItem::run(
                    format!("Change to heading {level}"),
                    Cmd::SetBlockType {
                        kind: BlockKind::Heading { level },
                    },
                )
                .label(format!("Level {level}")),
            )
        })
        .collect();

    let mut type_children = vec![Item(
        MenuItem::run(
            "Change to paragraph",
            Cmd::SetBlockType {
                kind: BlockKind::Paragraph,
            },
        )
        .label("Plain Text"),
    )];
    type_children.extend(code_submenus());
    type_children.push(MenuElement::Submenu {
        label: "Heading".to_string(),
        children: headings,
    });

    vec![
        vec![
            Item(MenuItem::run("Undo last change", Cmd::Undo).icon("undo")),
            Item(MenuItem::run("Redo last undone change", Cmd::Redo).icon("redo")),
        ],
        vec![
            mark("Toggle strong style", "strong", Mark::Strong),
            mark("Toggle emphasis", "em", Mark::Em),
            mark("Toggle underline", "underline", Mark::Underline),
            mark("Toggle inline code", "code", Mark::Code),
            Item(MenuItem::prompt("Add or remove link", Prompt::Link).icon("link")),
        ],
        vec![
            MenuElement::Dropdown {
                label: "Insert".to_string(),
                children: vec![
                    Item(MenuItem::prompt("Insert image", Prompt::Image).label("Image")),
                    Item(
                        MenuItem::run("Insert horizontal rule", Cmd::InsertHorizontalRule)
                            .label("Horizontal rule"),
                    ),
                    Item(MenuItem::prompt("Insert table", Prompt::Table).label("Table")),
                ],
            },
            MenuElement::Dropdown {
                label: "Type...".to_string(),
                children: type_children,
            },
        ],
        vec![
            align("left", "align_left", Align::Left),
            align("center", "align_center", Align::Center),
            align("right", "align_right", Align::Right),
        ],
        vec![
            Item(
                MenuItem::run(
                    "Wrap in bullet list",
                    Cmd::WrapInList {
                        list: ListKind::Bullet,
                    },
                )
                .icon("bullet_list")
                .hidden_when_unavailable(),
            ),
            Item(
                MenuItem::run(
                    "Wrap in ordered list",
                    Cmd::WrapInList {
                        list: ListKind::Ordered,
                    },
                )
                .icon("ordered_list")
                .hidden_when_unavailable(),
            ),
            Item(
                MenuItem::run("Wrap in block quote", Cmd::WrapInBlockquote)
                    .icon("blockquote")
                    .hidden_when_unavailable(),
            ),
            Item(
                MenuItem::run("Select parent node", Cmd::SelectParentNode)
                    .icon("select_parent")
                    .hidden_when_unavailable(),
            ),
            Item(MenuItem::run("Indent", Cmd::Tab { tab_size }).icon("indent")),
            Item(MenuItem::run("Outdent", Cmd::ShiftTab { tab_size }).icon("outdent")),
        ],
    ]
}
