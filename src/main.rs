use anyhow::{anyhow, Result};
use crossterm::style::Stylize;
use hugelist::config::Config;
use hugelist::grid::{HugeList, LifecycleEvent, RowEvent};
use hugelist::source::{self, SourceRequest};
use hugelist::table_display::{describe_row, display_window};
use hugelist::utils::app_paths::AppPaths;
use hugelist::utils::logging::init_tracing;
use hugelist::viewport::{Navigation, RowMeasurer, ScrollIntent};
use reedline::{
    default_emacs_keybindings, Emacs, FileBackedHistory, Prompt, PromptEditMode,
    PromptHistorySearch, PromptHistorySearchStatus, Reedline, Signal,
};
use std::borrow::Cow;
use std::ops::Range;

/// Prompt showing the working row count
struct GridPrompt {
    status: String,
}

impl Prompt for GridPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(format!("hugelist [{}]", self.status))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => "> ".into(),
            PromptEditMode::Vi(vi_mode) => match vi_mode {
                reedline::PromptViMode::Normal => "N> ".into(),
                reedline::PromptViMode::Insert => "I> ".into(),
            },
            PromptEditMode::Custom(str) => format!("{str}> ").into(),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse search: {})",
            prefix, history_search.term
        ))
    }
}

/// Page size from the terminal height, leaving room for borders, the
/// header, the totals row and the prompt
struct TerminalMeasurer;

const TERMINAL_OVERHEAD: usize = 10;

impl RowMeasurer for TerminalMeasurer {
    fn visible_rows(&mut self, probe: Range<usize>) -> usize {
        let height = crossterm::terminal::size()
            .map(|(_, rows)| rows as usize)
            .unwrap_or(24 + TERMINAL_OVERHEAD);
        // Each table row takes two lines (content + separator)
        let fit = height.saturating_sub(TERMINAL_OVERHEAD) / 2;
        probe.len().min(fit)
    }
}

fn print_help() {
    println!("{}", "HugeList - browse, search and sort large tables".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  hugelist [OPTIONS] <FILE.json|FILE.csv|http(s)://URL>");
    println!();
    println!("{}", "Options:".yellow());
    println!(
        "  {} - Generate config file with defaults",
        "--generate-config".green()
    );
    println!();
    println!("{}", "Commands:".yellow());
    println!("  {}  - Filter rows", "find <query> [in f1,f2]".green());
    println!("      a + b      every group somewhere in the row");
    println!("      &a b       all terms inside one field");
    println!("      a b        any term anywhere");
    println!("  {}                  - Show all rows again", "reset".green());
    println!("  {}          - Sort by column (+ adds a key)", "sort <col> [+]".green());
    println!("  {}                 - Drop all sort keys", "unsort".green());
    println!("  {}       - Move a column", "move <from> <to>".green());
    println!("  {}  - Hide or show columns", "hide <col> / show <col|all>".green());
    println!("  {}  - Paging", "next / prev / home / end".green());
    println!("  {}              - Move the cursor", "up / down".green());
    println!("  {}             - Jump to a row", "goto <row>".green());
    println!("  {}               - Set the page size", "rows <n>".green());
    println!("  {}  - Activate a row of the page", "click <n> / dblclick <n>".green());
    println!("  {}   - Field list / totals row", "fields / totals".green());
    println!("  {}                    - Recent log entries", "log".green());
    println!("  {}          - Help / exit", "help / quit".green());
    println!();
    println!("Columns may be given by name or 1-based number.");
    println!();
}

/// Column by 1-based number or by field name
fn resolve_column(grid: &HugeList, arg: &str) -> Option<usize> {
    if let Ok(n) = arg.parse::<usize>() {
        return (n >= 1 && n <= grid.fields().len()).then(|| n - 1);
    }
    grid.topology().position_of(arg)
}

fn show(grid: &mut HugeList) {
    let window = grid.window();
    let totals = grid.formatted_totals();
    display_window(&window, totals.as_deref(), grid.working_len());
}

fn generate_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, Config::create_default_with_comments())?;
    println!("Configuration file created at: {:?}", path);
    println!("Edit this file to customize HugeList.");
    Ok(())
}

/// Handle one command line; `Ok(false)` ends the session
fn run_command(grid: &mut HugeList, line: &str, config: &Config) -> Result<bool> {
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map(|(c, r)| (c, r.trim()))
        .unwrap_or((line, ""));
    let args: Vec<&str> = rest.split_whitespace().collect();

    match command {
        "quit" | "exit" | "q" => return Ok(false),
        "help" | "?" => print_help(),
        "find" => {
            if rest.is_empty() {
                return Err(anyhow!("Usage: find <query> [in f1,f2]"));
            }
            let (query, fields) = match rest.rsplit_once(" in ") {
                Some((query, fields)) => (query, vec![fields]),
                None => (rest, Vec::new()),
            };
            let found = grid.find(query, &fields);
            println!("{}", format!("{} rows found", found).cyan());
            show(grid);
        }
        "reset" => {
            let count = grid.find_reset();
            println!("{}", format!("{} rows", count).cyan());
            show(grid);
        }
        "sort" => {
            let column = args
                .first()
                .and_then(|a| resolve_column(grid, a))
                .ok_or_else(|| anyhow!("Usage: sort <col> [+]"))?;
            let multi = args.get(1) == Some(&"+");
            if multi || !config.behavior.multi_sort {
                grid.click_header(column, multi);
            } else {
                grid.sort_by_column(column);
            }
            println!("{}", format!("Order keys {:?}", grid.order_keys().raw()).cyan());
            show(grid);
        }
        "unsort" => {
            grid.clear_order();
            show(grid);
        }
        "move" => {
            let (from, to) = match args.as_slice() {
                [from, to] => (resolve_column(grid, from), resolve_column(grid, to)),
                _ => (None, None),
            };
            let (Some(from), Some(to)) = (from, to) else {
                return Err(anyhow!("Usage: move <from> <to>"));
            };
            if !grid.move_column(from, to) {
                println!("{}", "Column not moved".yellow());
            }
            show(grid);
        }
        "hide" => {
            let column = args
                .first()
                .and_then(|a| resolve_column(grid, a))
                .ok_or_else(|| anyhow!("Usage: hide <col>"))?;
            if !grid.set_column_visible(column, false) {
                println!("{}", "Cannot hide the last visible column".yellow());
            }
            show(grid);
        }
        "show" => {
            match args.first() {
                Some(&"all") => grid.show_all_columns(),
                Some(arg) => {
                    let column = resolve_column(grid, arg)
                        .ok_or_else(|| anyhow!("Unknown column {}", arg))?;
                    grid.set_column_visible(column, true);
                }
                None => return Err(anyhow!("Usage: show <col|all>")),
            }
            show(grid);
        }
        "next" | "prev" | "home" | "end" | "up" | "down" => {
            let navigation = match command {
                "next" => Navigation::PageDown,
                "prev" => Navigation::PageUp,
                "home" => Navigation::Home,
                "end" => Navigation::End,
                "up" => Navigation::Up,
                _ => Navigation::Down,
            };
            let result = grid.navigate(navigation);
            println!("{}", result.description.cyan());
            show(grid);
        }
        "goto" => {
            let row: i64 = args
                .first()
                .and_then(|a| a.parse().ok())
                .ok_or_else(|| anyhow!("Usage: goto <row>"))?;
            grid.render(ScrollIntent::Jump {
                from: row.saturating_sub(1),
                to: None,
            });
            show(grid);
        }
        "rows" => {
            let rows: usize = args
                .first()
                .and_then(|a| a.parse().ok())
                .ok_or_else(|| anyhow!("Usage: rows <n>"))?;
            grid.resize(rows);
            show(grid);
        }
        "click" | "dblclick" => {
            let slot: usize = args
                .first()
                .and_then(|a| a.parse().ok())
                .filter(|n| *n >= 1)
                .ok_or_else(|| anyhow!("Usage: {} <n>", command))?;
            let event = if command == "click" {
                RowEvent::Click
            } else {
                RowEvent::DoubleClick
            };
            if !grid.activate(slot - 1, event) {
                println!("{}", "No such row on this page".yellow());
            } else if event == RowEvent::DoubleClick {
                if let Some(row) = grid.selected_row() {
                    println!("  {}", describe_row(row, grid.fields()));
                }
            }
        }
        "fields" => {
            for (i, field) in grid.fields().iter().enumerate() {
                let hidden = if grid.topology().is_hidden(i) {
                    " (hidden)"
                } else {
                    ""
                };
                let order = match grid.order_keys().direction_of(i) {
                    Some(true) => " ▲",
                    Some(false) => " ▼",
                    None => "",
                };
                println!("  {:>3} {} [{}]{}{}", i + 1, field.display_label(), field.name, order, hidden);
            }
        }
        "totals" => match grid.formatted_totals() {
            Some(totals) => {
                for (field, total) in grid.fields().iter().zip(totals) {
                    if !total.is_empty() {
                        println!("  {}: {}", field.display_label(), total);
                    }
                }
            }
            None => println!("{}", "Totals row is disabled".yellow()),
        },
        "log" => {
            if let Some(buffer) = hugelist::utils::logging::get_log_buffer() {
                for entry in buffer.get_recent(30) {
                    println!("{}", entry.format_for_display());
                }
            }
        }
        other => return Err(anyhow!("Unknown command '{}', try 'help'", other)),
    }

    Ok(true)
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--generate-config") {
        return generate_config();
    }

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Could not load config ({}), using defaults", e);
        Config::default()
    });
    init_tracing(&config.logging);

    let Some(location) = args.iter().skip(1).find(|a| !a.starts_with("--")) else {
        print_help();
        return Err(anyhow!("No data source given"));
    };

    let mut grid = HugeList::with_config(&config);
    grid.on_lifecycle(LifecycleEvent::StartIndexing, || {
        println!("{}", "Indexing...".dark_grey())
    });
    grid.on_lifecycle(LifecycleEvent::NotOk, || {
        eprintln!("{}", "The data source did not return data".red())
    });

    let source = source::open(location, &config.transport)?;
    let loaded = grid.load_from(source.as_ref(), &SourceRequest::new())?;
    println!("{}", format!("Loaded {} rows from {}", loaded, source.describe()).cyan());

    grid.on_row_event(RowEvent::Click, |row, index| {
        println!("{}", format!("Row {}: {}", index + 1, row.to_strings().join(" | ")).cyan())
    });
    grid.on_row_event(RowEvent::DoubleClick, |_, index| {
        println!("{}", format!("Row {}", index + 1).bold());
    });

    grid.measure(&mut TerminalMeasurer);
    print_help();
    show(&mut grid);

    let mut line_editor = Reedline::create().with_edit_mode(Box::new(Emacs::new(
        default_emacs_keybindings(),
    )));
    match AppPaths::history_file().and_then(|path| {
        FileBackedHistory::with_file(100, path).map_err(|e| anyhow!("{}", e))
    }) {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => eprintln!("History disabled: {}", e),
    }

    let mut prompt = GridPrompt {
        status: String::new(),
    };

    loop {
        prompt.status = format!("{}/{}", grid.working_len(), grid.source_len());
        match line_editor.read_line(&prompt)? {
            Signal::Success(buffer) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match run_command(&mut grid, trimmed, &config) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                }
            }
            Signal::CtrlD | Signal::CtrlC => break,
        }
    }

    println!("\nGoodbye!");
    Ok(())
}
