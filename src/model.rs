use arboard::Clipboard;
use tracing::{debug, info, trace};

use crate::data::{Company, Employee, MockSource, Record, RowSource, Ticket};
use crate::domain::{AppConfig, CmdMode, Collection, HELP_TEXT, HrError, Message, Session};
use crate::inputter::{Prompt, PromptResult};
use crate::list::{ListState, SortDirection};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy)]
enum Modus {
    TABLE,
    POPUP,
    CONFIRM,
    CMDINPUT,
}

const PAGE_SIZES: &[usize] = &[10, 25, 50];

/// Type-erased view over one `ListState<T>` so the model can hold tables of
/// different record types side by side. Everything the UI needs is strings.
pub trait TablePage {
    fn headers(&self) -> Vec<String>;
    fn column_count(&self) -> usize;
    fn sort_marker(&self) -> Option<(usize, SortDirection)>;
    fn visible_cells(&self) -> Vec<Vec<String>>;
    fn visible_len(&self) -> usize;
    fn total_rows(&self) -> usize;
    fn filtered_rows(&self) -> usize;
    fn page(&self) -> usize;
    fn page_count(&self) -> usize;
    fn page_size(&self) -> usize;
    fn search(&self) -> String;
    fn selected_count(&self) -> usize;
    fn is_selected(&self, visible: usize) -> bool;
    fn cell(&self, visible: usize, col: usize) -> Option<String>;
    fn row_csv(&self, visible: usize) -> Option<String>;
    fn sort(&mut self, col: usize, direction: SortDirection);
    fn set_search(&mut self, text: String);
    fn next_page(&mut self);
    fn prev_page(&mut self);
    fn set_page_size(&mut self, size: usize);
    fn toggle_selected(&mut self, visible: usize);
    fn select_all(&mut self);
    fn clear_selection(&mut self);
    fn delete(&mut self, visible: usize) -> bool;
}

impl<T: Sync> TablePage for ListState<T> {
    fn headers(&self) -> Vec<String> {
        self.fields().iter().map(|f| f.label.to_string()).collect()
    }

    fn column_count(&self) -> usize {
        self.fields().len()
    }

    fn sort_marker(&self) -> Option<(usize, SortDirection)> {
        self.query().order_by.map(|col| (col, self.query().direction))
    }

    fn visible_cells(&self) -> Vec<Vec<String>> {
        self.visible_rows()
            .iter()
            .map(|row| {
                self.fields()
                    .iter()
                    .map(|field| (field.get)(row).to_string())
                    .collect()
            })
            .collect()
    }

    fn visible_len(&self) -> usize {
        self.page_indices().len()
    }

    fn total_rows(&self) -> usize {
        self.len()
    }

    fn filtered_rows(&self) -> usize {
        self.filtered_indices().len()
    }

    fn page(&self) -> usize {
        self.current_page()
    }

    fn page_count(&self) -> usize {
        ListState::page_count(self)
    }

    fn page_size(&self) -> usize {
        self.query().page_size
    }

    fn search(&self) -> String {
        self.query().search.clone()
    }

    fn selected_count(&self) -> usize {
        ListState::selected_count(self)
    }

    fn is_selected(&self, visible: usize) -> bool {
        ListState::is_selected(self, visible)
    }

    fn cell(&self, visible: usize, col: usize) -> Option<String> {
        let row = *self.page_indices().get(visible)?;
        let field = self.fields().get(col)?;
        Some((field.get)(&self.rows()[row]).to_string())
    }

    fn row_csv(&self, visible: usize) -> Option<String> {
        let row = *self.page_indices().get(visible)?;
        let cells: Vec<String> = self
            .fields()
            .iter()
            .map(|field| wrap_cell_content(&(field.get)(&self.rows()[row]).to_string()))
            .collect();
        Some(cells.join(","))
    }

    fn sort(&mut self, col: usize, direction: SortDirection) {
        self.sort_by(col, direction);
    }

    fn set_search(&mut self, text: String) {
        ListState::set_search(self, text);
    }

    fn next_page(&mut self) {
        ListState::next_page(self);
    }

    fn prev_page(&mut self) {
        ListState::prev_page(self);
    }

    fn set_page_size(&mut self, size: usize) {
        ListState::set_page_size(self, size);
    }

    fn toggle_selected(&mut self, visible: usize) {
        ListState::toggle_selected(self, visible);
    }

    fn select_all(&mut self) {
        self.select_all_visible();
    }

    fn clear_selection(&mut self) {
        ListState::clear_selection(self);
    }

    fn delete(&mut self, visible: usize) -> bool {
        ListState::delete(self, visible).is_some()
    }
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace("\"", "\"\"");
    }
    if needs_wrapping {
        out = format!("\"{out}\"");
    }
    out
}

/// Snapshot handed to the rendering layer.
pub struct UiData {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub selected: Vec<bool>,
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub page: usize,
    pub page_count: usize,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub selected_count: usize,
    pub search: String,
    pub status_message: String,
    pub popup: Option<String>,
    pub confirm: Option<String>,
    pub prompt: Option<PromptResult>,
}

pub struct Model {
    session: Session,
    pub status: Status,
    modus: Modus,
    pages: Vec<(Collection, Box<dyn TablePage>)>,
    current: usize,
    cursor_row: usize,
    cursor_col: usize,
    pending_delete: Option<usize>,
    popup: Option<String>,
    prompt: Prompt,
    cmd_mode: Option<CmdMode>,
    last_prompt: PromptResult,
    clipboard: Option<Clipboard>,
    status_message: String,
}

fn page_from<T: Record + 'static>(
    source: &dyn RowSource<T>,
    page_size: usize,
) -> Result<Box<dyn TablePage>, HrError> {
    let rows = source.fetch()?;
    Ok(Box::new(ListState::new(rows, T::fields(), page_size)))
}

impl Model {
    /// Builds one table page per collection the session can reach. Each page
    /// fetches its rows exactly once; `sources` decides where they come from.
    pub fn init(
        session: Session,
        config: AppConfig,
        sources: &dyn PageSources,
    ) -> Result<Self, HrError> {
        let mut pages: Vec<(Collection, Box<dyn TablePage>)> = Vec::new();
        for &collection in session.collections() {
            let page = match collection {
                Collection::Tickets => page_from(sources.tickets(), config.page_size)?,
                Collection::Employees => page_from(sources.employees(), config.page_size)?,
                Collection::Companies => page_from(sources.companies(), config.page_size)?,
            };
            pages.push((collection, page));
        }
        info!(
            "Session for {} ({:?}), {} collections",
            session.user,
            session.role,
            pages.len()
        );

        Ok(Model {
            session,
            status: Status::READY,
            modus: Modus::TABLE,
            pages,
            current: 0,
            cursor_row: 0,
            cursor_col: 0,
            pending_delete: None,
            popup: None,
            prompt: Prompt::default(),
            cmd_mode: None,
            last_prompt: PromptResult::default(),
            clipboard: Clipboard::new().ok(),
            status_message: "Ready.".to_string(),
        })
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    /// True while the search prompt consumes raw key events.
    pub fn raw_keyevents(&self) -> bool {
        matches!(self.modus, Modus::CMDINPUT)
    }

    fn page(&self) -> &dyn TablePage {
        self.pages[self.current].1.as_ref()
    }

    fn page_mut(&mut self) -> &mut dyn TablePage {
        self.pages[self.current].1.as_mut()
    }

    fn collection(&self) -> Collection {
        self.pages[self.current].0
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    // The page under the cursor can shrink (search, delete, page change).
    fn clamp_cursor(&mut self) {
        let rows = self.page().visible_len();
        let cols = self.page().column_count();
        self.cursor_row = self.cursor_row.min(rows.saturating_sub(1));
        self.cursor_col = self.cursor_col.min(cols.saturating_sub(1));
    }

    pub fn update(&mut self, message: Message) -> Result<(), HrError> {
        trace!("Update: {:?} in {:?}", message, self.modus);
        match self.modus {
            Modus::TABLE => self.update_table(message),
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Confirm | Message::Help => {
                    self.popup = None;
                    self.modus = Modus::TABLE;
                }
                _ => (),
            },
            Modus::CONFIRM => match message {
                Message::Quit => self.quit(),
                Message::Confirm => self.confirm_delete(),
                Message::Abort | Message::Exit => {
                    self.pending_delete = None;
                    self.modus = Modus::TABLE;
                    self.set_status_message("Deletion canceled.");
                }
                _ => (),
            },
            Modus::CMDINPUT => {
                if let Message::RawKey(key) = message {
                    self.last_prompt = self.prompt.read(key);
                    if self.last_prompt.finished {
                        self.finish_prompt();
                    }
                }
            }
        }
        Ok(())
    }

    fn update_table(&mut self, message: Message) {
        match message {
            Message::Quit => self.quit(),
            Message::MoveUp => {
                self.cursor_row = self.cursor_row.saturating_sub(1);
            }
            Message::MoveDown => {
                self.cursor_row += 1;
                self.clamp_cursor();
            }
            Message::MoveLeft => {
                self.cursor_col = self.cursor_col.saturating_sub(1);
            }
            Message::MoveRight => {
                self.cursor_col += 1;
                self.clamp_cursor();
            }
            Message::MoveBeginning => self.cursor_row = 0,
            Message::MoveEnd => {
                self.cursor_row = self.page().visible_len().saturating_sub(1);
            }
            Message::NextPage => {
                self.page_mut().next_page();
                self.cursor_row = 0;
                self.page_status();
            }
            Message::PrevPage => {
                self.page_mut().prev_page();
                self.cursor_row = 0;
                self.page_status();
            }
            Message::CyclePageSize => self.cycle_page_size(),
            Message::SortAscending => self.sort_current(SortDirection::Ascending),
            Message::SortDescending => self.sort_current(SortDirection::Descending),
            Message::Search => self.enter_search(),
            Message::ToggleSelect => {
                let row = self.cursor_row;
                self.page_mut().toggle_selected(row);
            }
            Message::SelectAll => {
                self.page_mut().select_all();
                let n = self.page().selected_count();
                self.set_status_message(format!("Selected {n} rows."));
            }
            Message::ClearSelection => {
                self.page_mut().clear_selection();
                self.set_status_message("Selection cleared.");
            }
            Message::Delete => self.request_delete(),
            Message::NextCollection => self.next_collection(),
            Message::CopyCell => self.copy_cell(),
            Message::CopyRow => self.copy_row(),
            Message::Help => {
                self.popup = Some(HELP_TEXT.to_string());
                self.modus = Modus::POPUP;
            }
            Message::Exit => {
                // Esc drops an active search, back to the full collection.
                if !self.page().search().is_empty() {
                    self.page_mut().set_search(String::new());
                    self.clamp_cursor();
                    self.set_status_message("Search cleared.");
                }
            }
            Message::Resize(width, height) => {
                trace!("UI resized to {}x{}", width, height);
            }
            Message::Confirm | Message::Abort | Message::RawKey(_) => (),
        }
    }

    fn page_status(&mut self) {
        let page = self.page().page();
        let pages = self.page().page_count();
        self.set_status_message(format!("Page {page}/{pages}"));
    }

    fn cycle_page_size(&mut self) {
        let current = self.page().page_size();
        let pos = PAGE_SIZES.iter().position(|&s| s == current).unwrap_or(0);
        let next = PAGE_SIZES[(pos + 1) % PAGE_SIZES.len()];
        self.page_mut().set_page_size(next);
        self.cursor_row = 0;
        self.set_status_message(format!("{next} rows per page."));
    }

    fn sort_current(&mut self, direction: SortDirection) {
        let col = self.cursor_col;
        self.page_mut().sort(col, direction);
        let header = self.page().headers().get(col).cloned().unwrap_or_default();
        debug!("Sorted by {} {:?}", header, direction);
        self.set_status_message(format!("Sorted by {header} ({direction:?})."));
    }

    fn enter_search(&mut self) {
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(CmdMode::Search);
        self.prompt.clear();
        self.last_prompt = self.prompt.get();
    }

    fn finish_prompt(&mut self) {
        self.modus = Modus::TABLE;
        let result = self.last_prompt.clone();
        if self.cmd_mode.take() == Some(CmdMode::Search) && !result.canceled {
            self.page_mut().set_search(result.text.clone());
            self.cursor_row = 0;
            self.clamp_cursor();
            let found = self.page().filtered_rows();
            self.set_status_message(format!("\"{}\": {} matching rows.", result.text, found));
        }
    }

    fn request_delete(&mut self) {
        if self.page().visible_len() == 0 {
            return;
        }
        self.pending_delete = Some(self.cursor_row);
        self.modus = Modus::CONFIRM;
    }

    // Runs only after an explicit confirmation from the CONFIRM prompt.
    fn confirm_delete(&mut self) {
        self.modus = Modus::TABLE;
        if let Some(visible) = self.pending_delete.take() {
            if self.page_mut().delete(visible) {
                self.clamp_cursor();
                let left = self.page().total_rows();
                self.set_status_message(format!("Row deleted, {left} rows left."));
            }
        }
    }

    fn next_collection(&mut self) {
        self.current = (self.current + 1) % self.pages.len();
        self.cursor_row = 0;
        self.cursor_col = 0;
        self.set_status_message(format!("Showing {}.", self.collection().title()));
    }

    fn copy_cell(&mut self) {
        let Some(cell) = self.page().cell(self.cursor_row, self.cursor_col) else {
            return;
        };
        self.copy_to_clipboard(cell, "Copied cell.");
    }

    fn copy_row(&mut self) {
        let Some(row) = self.page().row_csv(self.cursor_row) else {
            return;
        };
        self.copy_to_clipboard(row, "Copied row.");
    }

    fn copy_to_clipboard(&mut self, content: String, note: &str) {
        match self.clipboard.as_mut() {
            Some(clipboard) => match clipboard.set_text(content) {
                Ok(_) => self.set_status_message(note),
                Err(e) => self.set_status_message(format!("Clipboard error: {e:?}")),
            },
            None => self.set_status_message("No clipboard available."),
        }
    }

    pub fn ui_data(&self) -> UiData {
        let page = self.page();
        let mut headers = page.headers();
        if let Some((col, direction)) = page.sort_marker() {
            if let Some(header) = headers.get_mut(col) {
                let arrow = match direction {
                    SortDirection::Ascending => " ▲",
                    SortDirection::Descending => " ▼",
                };
                header.push_str(arrow);
            }
        }
        let selected = (0..page.visible_len()).map(|i| page.is_selected(i)).collect();

        let confirm = self.pending_delete.map(|visible| {
            let subject = page.cell(visible, 1).unwrap_or_default();
            format!("Delete row \"{subject}\"? (y/n)")
        });

        UiData {
            title: format!(
                "{} — {} ({:?})",
                self.collection().title(),
                self.session.user,
                self.session.role
            ),
            headers,
            rows: page.visible_cells(),
            selected,
            cursor_row: self.cursor_row,
            cursor_col: self.cursor_col,
            page: page.page(),
            page_count: page.page_count(),
            total_rows: page.total_rows(),
            filtered_rows: page.filtered_rows(),
            selected_count: page.selected_count(),
            search: page.search(),
            status_message: self.status_message.clone(),
            popup: self.popup.clone(),
            confirm,
            prompt: self.raw_keyevents().then(|| self.last_prompt.clone()),
        }
    }
}

/// Where each collection's rows come from. `main` builds one of these from
/// the CLI; tests plug in mocks directly.
pub trait PageSources {
    fn tickets(&self) -> &dyn RowSource<Ticket>;
    fn employees(&self) -> &dyn RowSource<Employee>;
    fn companies(&self) -> &dyn RowSource<Company>;
}

/// All collections backed by the built-in demo data.
pub struct MockPages;

impl PageSources for MockPages {
    fn tickets(&self) -> &dyn RowSource<Ticket> {
        &MockSource
    }

    fn employees(&self) -> &dyn RowSource<Employee> {
        &MockSource
    }

    fn companies(&self) -> &dyn RowSource<Company> {
        &MockSource
    }
}
