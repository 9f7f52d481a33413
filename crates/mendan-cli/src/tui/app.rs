//! Application state and logic

use std::path::PathBuf;

use chrono::{Datelike, Duration, Months, NaiveDate};

use mendan_core::models::{date_key, parse_date_key};
use mendan_core::search::{filter_days, matching_entries};
use mendan_core::templates::TEMPLATE_SLOTS;
use mendan_core::{
    Config, DayChange, DayRecord, EntryEditor, EntryField, EntryOptions, MonthCursor,
    RecordStore, RestorePlan, SearchHit, TemplateStore, TransferError,
};

use crate::commands::export;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Calendar navigation
    Normal,
    /// Typing a search query (after pressing /)
    Search,
    /// Command input mode (after pressing :)
    Command,
    /// Editing one date's records
    Editor,
    /// Editing the template slots
    Templates,
    /// Waiting for y/n on a destructive action
    Confirm,
}

/// Which pane has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    Calendar,
    Day,
}

impl ActivePane {
    pub fn toggle(self) -> Self {
        match self {
            ActivePane::Calendar => ActivePane::Day,
            ActivePane::Day => ActivePane::Calendar,
        }
    }
}

/// Destructive actions that need a y/n answer
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmAction {
    DeleteDate(String),
    ClearAll,
    Restore(RestorePlan),
    ClearTemplate(usize),
}

/// A question shown in the confirm dialog
#[derive(Debug, Clone)]
pub struct PendingConfirm {
    pub action: ConfirmAction,
    pub prompt: String,
    /// Mode to go back to when the answer is no
    pub return_mode: InputMode,
}

/// Focused position inside the entry editor
pub struct EditorState {
    pub editor: EntryEditor,
    pub entry_index: usize,
    pub field: EntryField,
}

impl EditorState {
    pub fn new(editor: EntryEditor) -> Self {
        Self {
            editor,
            entry_index: 0,
            field: EntryField::StudentName,
        }
    }

    /// Id of the focused entry
    pub fn current_id(&self) -> Option<String> {
        self.editor
            .entries()
            .get(self.entry_index)
            .map(|e| e.id.clone())
    }

    /// Move focus to the next field, continuing into the next entry
    pub fn next_field(&mut self) {
        let position = field_position(self.field);
        if position + 1 < EntryField::ALL.len() {
            self.field = EntryField::ALL[position + 1];
        } else {
            self.field = EntryField::ALL[0];
            let count = self.editor.entries().len().max(1);
            self.entry_index = (self.entry_index + 1) % count;
        }
    }

    /// Move focus to the previous field, continuing into the previous entry
    pub fn prev_field(&mut self) {
        let position = field_position(self.field);
        if position > 0 {
            self.field = EntryField::ALL[position - 1];
        } else {
            self.field = EntryField::ALL[EntryField::ALL.len() - 1];
            let count = self.editor.entries().len().max(1);
            self.entry_index = (self.entry_index + count - 1) % count;
        }
    }

    fn is_choice_field(&self) -> bool {
        self.editor.options().choices(self.field).is_some()
    }

    /// Type a character into the focused text field
    pub fn insert_char(&mut self, c: char) {
        if self.is_choice_field() {
            return;
        }
        let Some(id) = self.current_id() else {
            return;
        };
        let mut value = self
            .editor
            .entry(&id)
            .map(|e| e.field(self.field).to_string())
            .unwrap_or_default();
        value.push(c);
        self.editor.set_field(&id, self.field, value);
    }

    /// Delete the last character of the focused text field
    pub fn delete_char(&mut self) {
        if self.is_choice_field() {
            return;
        }
        let Some(id) = self.current_id() else {
            return;
        };
        let mut value = self
            .editor
            .entry(&id)
            .map(|e| e.field(self.field).to_string())
            .unwrap_or_default();
        value.pop();
        self.editor.set_field(&id, self.field, value);
    }

    /// Enter: newline in the content, otherwise move on
    pub fn newline(&mut self) {
        if self.field == EntryField::Content {
            self.insert_char('\n');
        } else {
            self.next_field();
        }
    }

    /// Step the focused choice field
    pub fn cycle(&mut self, forward: bool) {
        if let Some(id) = self.current_id() {
            self.editor.cycle_choice(&id, self.field, forward);
        }
    }

    pub fn add_entry(&mut self) {
        self.editor.add_entry();
        self.entry_index = self.editor.entries().len().saturating_sub(1);
        self.field = EntryField::StudentName;
    }

    pub fn remove_current(&mut self) {
        if let Some(id) = self.current_id() {
            self.editor.remove_entry(&id);
        }
        self.entry_index = self
            .entry_index
            .min(self.editor.entries().len().saturating_sub(1));
    }

    /// Append template text to the focused entry's content
    pub fn insert_template(&mut self, text: &str) -> bool {
        match self.current_id() {
            Some(id) => self.editor.append_content(&id, text),
            None => false,
        }
    }

    /// Content of the focused entry (for the external editor)
    pub fn current_content(&self) -> Option<String> {
        let id = self.current_id()?;
        self.editor.entry(&id).map(|e| e.content.clone())
    }

    pub fn set_current_content(&mut self, content: String) {
        if let Some(id) = self.current_id() {
            self.editor.set_field(&id, EntryField::Content, content);
        }
    }
}

fn field_position(field: EntryField) -> usize {
    EntryField::ALL
        .iter()
        .position(|f| *f == field)
        .unwrap_or(0)
}

/// Working copies of the template slots
pub struct TemplateState {
    pub tab: usize,
    pub drafts: Vec<String>,
}

impl TemplateState {
    pub fn next_tab(&mut self) {
        self.tab = (self.tab + 1) % TEMPLATE_SLOTS;
    }

    pub fn prev_tab(&mut self) {
        self.tab = (self.tab + TEMPLATE_SLOTS - 1) % TEMPLATE_SLOTS;
    }

    pub fn current(&self) -> &str {
        self.drafts.get(self.tab).map(String::as_str).unwrap_or_default()
    }

    pub fn current_mut(&mut self) -> Option<&mut String> {
        self.drafts.get_mut(self.tab)
    }
}

/// Result of command execution
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    Done,
    Quit,
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_quit: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Which pane has focus
    pub active_pane: ActivePane,
    /// Displayed month
    pub cursor: MonthCursor,
    /// Selected date
    pub selected: NaiveDate,
    /// Today's date, fixed at startup
    pub today: NaiveDate,
    /// Selected record in the day pane
    pub day_index: usize,
    /// Search query
    pub search_query: String,
    /// Days filtered by the search query
    pub filtered: Vec<DayRecord>,
    /// Flattened search results
    pub hits: Vec<SearchHit>,
    /// Selected search result
    pub hit_index: usize,
    /// Command input buffer
    pub command_input: String,
    /// Open entry editor
    pub editor: Option<EditorState>,
    /// Template slots
    pub templates: TemplateStore,
    /// Open template editor
    pub template_state: Option<TemplateState>,
    /// Open confirm dialog
    pub pending_confirm: Option<PendingConfirm>,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<std::time::Instant>,
    /// Error shown in a modal until a key is pressed
    pub error: Option<String>,
    /// Whether help overlay is visible
    pub show_help: bool,
    /// Choices for new entries
    pub options: EntryOptions,
    /// Used for export file names
    pub config: Config,
}

impl App {
    pub fn new(config: &Config, templates: TemplateStore, today: NaiveDate) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            active_pane: ActivePane::Calendar,
            cursor: MonthCursor::containing(today),
            selected: today,
            today,
            day_index: 0,
            search_query: String::new(),
            filtered: Vec::new(),
            hits: Vec::new(),
            hit_index: 0,
            command_input: String::new(),
            editor: None,
            templates,
            template_state: None,
            pending_confirm: None,
            status_message: None,
            status_message_time: None,
            error: None,
            show_help: false,
            options: EntryOptions::from(config),
            config: config.clone(),
        }
    }

    // ==================== Messages ====================

    /// Set a status message (will auto-dismiss after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(std::time::Instant::now());
    }

    /// Clear an expired status message; returns true if it was cleared
    pub fn check_status_timeout(&mut self) -> bool {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > std::time::Duration::from_secs(3) {
                self.status_message = None;
                self.status_message_time = None;
                return true;
            }
        }
        false
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    // ==================== Calendar ====================

    /// Store key of the selected date
    pub fn selected_key(&self) -> String {
        date_key(self.selected)
    }

    /// Days shown on the calendar: everything, or the search matches
    pub fn visible_days<'a>(&'a self, store: &'a RecordStore) -> &'a [DayRecord] {
        if self.search_query.is_empty() {
            store.days()
        } else {
            &self.filtered
        }
    }

    /// Select a date, moving the displayed month with it
    ///
    /// Dates whose month cannot be shown as a full grid are ignored.
    pub fn select_date(&mut self, date: NaiveDate) {
        let cursor = MonthCursor::containing(date);
        if !cursor.contains(date) {
            return;
        }
        self.selected = date;
        self.cursor = cursor;
        self.day_index = 0;
    }

    /// Move the selection by a number of days
    pub fn move_days(&mut self, delta: i64) {
        if let Some(date) = self.selected.checked_add_signed(Duration::days(delta)) {
            self.select_date(date);
        }
    }

    /// Move to the same day of another month (clamped to its length)
    pub fn move_months(&mut self, delta: i32) {
        let months = Months::new(delta.unsigned_abs());
        let moved = if delta >= 0 {
            self.selected.checked_add_months(months)
        } else {
            self.selected.checked_sub_months(months)
        };
        if let Some(date) = moved {
            self.select_date(date);
        }
    }

    pub fn go_today(&mut self) {
        self.select_date(self.today);
    }

    /// Jump to a month offered by the year selector
    pub fn go_to_month(&mut self, year: i32, month: u32) -> bool {
        if !self.cursor.year_options().contains(&year) {
            return false;
        }
        let Some(cursor) = MonthCursor::new(year, month) else {
            return false;
        };
        let day = self.selected.day().min(mendan_core::calendar::days_in_month(year, month));
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            self.select_date(date);
        }
        self.cursor = cursor;
        true
    }

    // ==================== Day pane ====================

    pub fn move_up(&mut self) {
        if !self.search_query.is_empty() {
            self.hit_index = self.hit_index.saturating_sub(1);
        } else {
            self.day_index = self.day_index.saturating_sub(1);
        }
    }

    pub fn move_down(&mut self, store: &RecordStore) {
        if !self.search_query.is_empty() {
            if self.hit_index + 1 < self.hits.len() {
                self.hit_index += 1;
            }
        } else if self.day_index + 1 < store.records_for(&self.selected_key()).len() {
            self.day_index += 1;
        }
    }

    /// Jump to the date of the selected search result
    pub fn open_selected_hit(&mut self) -> bool {
        let Some(date) = self
            .hits
            .get(self.hit_index)
            .and_then(|h| parse_date_key(&h.date))
        else {
            return false;
        };
        self.select_date(date);
        true
    }

    // ==================== Search ====================

    pub fn enter_search_mode(&mut self) {
        self.input_mode = InputMode::Search;
    }

    pub fn search_insert(&mut self, c: char, store: &RecordStore) {
        self.search_query.push(c);
        self.refresh_search(store);
    }

    pub fn search_backspace(&mut self, store: &RecordStore) {
        self.search_query.pop();
        self.refresh_search(store);
    }

    pub fn clear_search(&mut self, store: &RecordStore) {
        self.search_query.clear();
        self.refresh_search(store);
        self.input_mode = InputMode::Normal;
    }

    /// Recompute cached search results
    pub fn refresh_search(&mut self, store: &RecordStore) {
        self.filtered = filter_days(store.days(), &self.search_query);
        self.hits = matching_entries(store.days(), &self.search_query);
        self.hit_index = self.hit_index.min(self.hits.len().saturating_sub(1));
    }

    /// Called whenever the store's revision changes
    pub fn on_store_changed(&mut self, store: &RecordStore) {
        if !self.search_query.is_empty() {
            self.refresh_search(store);
        }
        let count = store.records_for(&self.selected_key()).len();
        self.day_index = self.day_index.min(count.saturating_sub(1));
    }

    // ==================== Editor ====================

    /// Open the editor on the selected date
    pub fn open_editor(&mut self, store: &RecordStore) {
        let key = self.selected_key();
        let editor = EntryEditor::open(key, store.records_for(&self.selected_key()), self.options.clone());
        self.editor = Some(EditorState::new(editor));
        self.input_mode = InputMode::Editor;
    }

    /// Close the editor, discarding edits
    pub fn close_editor(&mut self) {
        self.editor = None;
        self.input_mode = InputMode::Normal;
    }

    /// Validate and store the editor contents
    pub fn save_editor(&mut self, store: &mut RecordStore) {
        let Some(state) = self.editor.as_mut() else {
            return;
        };

        match state.editor.save() {
            Ok(intent) => {
                let date = state.editor.date().to_string();
                let change = store.apply(intent);
                self.close_editor();
                match change {
                    DayChange::Added | DayChange::Updated => {
                        self.set_status(format!("{} の記録を保存しました", date))
                    }
                    DayChange::Removed => self.set_status(format!("{} の記録を削除しました", date)),
                    DayChange::Unchanged => self.set_status("保存する記録はありません"),
                }
            }
            Err(failed) => {
                if let Some((id, _)) = failed.errors.iter().next() {
                    if let Some(index) = state.editor.entries().iter().position(|e| e.id == *id) {
                        state.entry_index = index;
                    }
                }
                self.set_status("必須項目が入力されていません。");
            }
        }
    }

    /// Insert template `slot` (0-based) into the focused entry
    pub fn insert_template(&mut self, slot: usize) {
        let text = self.templates.get(slot).unwrap_or_default().to_string();
        if text.is_empty() {
            self.set_status(format!("テンプレート {} は空です", slot + 1));
            return;
        }
        if let Some(state) = self.editor.as_mut() {
            state.insert_template(&text);
        }
    }

    // ==================== Templates ====================

    pub fn open_templates(&mut self) {
        self.template_state = Some(TemplateState {
            tab: 0,
            drafts: self.templates.templates().to_vec(),
        });
        self.input_mode = InputMode::Templates;
    }

    pub fn close_templates(&mut self) {
        self.template_state = None;
        self.input_mode = InputMode::Normal;
    }

    /// Save the active template tab
    pub fn save_template(&mut self) {
        let Some(state) = self.template_state.as_ref() else {
            return;
        };
        let tab = state.tab;
        let content = state.current().to_string();
        if self.templates.save(tab, content) {
            self.set_status(format!("テンプレート {} を保存しました。", tab + 1));
        }
    }

    // ==================== Confirmations ====================

    fn ask(&mut self, action: ConfirmAction, prompt: String) {
        self.pending_confirm = Some(PendingConfirm {
            action,
            prompt,
            return_mode: self.input_mode,
        });
        self.input_mode = InputMode::Confirm;
    }

    /// Ask before deleting the selected (or edited) date
    pub fn request_delete_date(&mut self, store: &RecordStore) {
        let date = self
            .editor
            .as_ref()
            .map(|s| s.editor.date().to_string())
            .unwrap_or_else(|| self.selected_key());
        if !store.contains(&date) {
            self.set_status("この日の記録はありません");
            return;
        }
        let prompt = format!("{} のすべての記録を削除しますか？", date);
        self.ask(ConfirmAction::DeleteDate(date), prompt);
    }

    /// Ask before deleting everything
    pub fn request_clear_all(&mut self, store: &RecordStore) {
        if store.is_empty() {
            self.set_status("削除する記録はありません");
            return;
        }
        let prompt = format!(
            "すべての記録 ({} 日, {} 件) を削除しますか？この操作は元に戻せません。",
            store.date_count(),
            store.entry_count()
        );
        self.ask(ConfirmAction::ClearAll, prompt);
    }

    /// Validate a backup and ask before restoring it
    pub fn request_restore(&mut self, path: PathBuf) {
        match RestorePlan::from_file(&path) {
            Ok(plan) => {
                let mut prompt = format!(
                    "{} 日分 ({} 件) の記録で現在のデータをすべて上書きします。",
                    plan.day_count(),
                    plan.entry_count()
                );
                if plan.empty_day_count() > 0 {
                    prompt.push_str(&format!(" うち {} 日は記録が空です。", plan.empty_day_count()));
                }
                prompt.push_str(" よろしいですか？");
                self.ask(ConfirmAction::Restore(plan), prompt);
            }
            Err(e @ TransferError::Io { .. }) => self.set_error(e.to_string()),
            Err(e) => self.set_error(format!("ファイルの形式が正しくありません。\n{}", e)),
        }
    }

    /// Ask before emptying the active template tab
    pub fn request_clear_template(&mut self) {
        let Some(tab) = self.template_state.as_ref().map(|s| s.tab) else {
            return;
        };
        self.ask(
            ConfirmAction::ClearTemplate(tab),
            format!("テンプレート {} を削除しますか？", tab + 1),
        );
    }

    /// Carry out the pending action
    pub fn confirm(&mut self, store: &mut RecordStore) {
        let Some(pending) = self.pending_confirm.take() else {
            return;
        };

        match pending.action {
            ConfirmAction::DeleteDate(date) => {
                store.remove_for_date(&date);
                self.close_editor();
                self.set_status(format!("{} の記録を削除しました", date));
            }
            ConfirmAction::ClearAll => {
                store.clear_all();
                self.input_mode = InputMode::Normal;
                self.set_status("すべての記録を削除しました");
            }
            ConfirmAction::Restore(plan) => {
                let days = plan.day_count();
                store.replace_all(plan.into_days());
                self.input_mode = InputMode::Normal;
                self.set_status(format!("{} 日分の記録を復元しました", days));
            }
            ConfirmAction::ClearTemplate(slot) => {
                self.templates.clear(slot);
                if let Some(draft) = self
                    .template_state
                    .as_mut()
                    .and_then(|s| s.drafts.get_mut(slot))
                {
                    draft.clear();
                }
                self.input_mode = InputMode::Templates;
                self.set_status(format!("テンプレート {} を削除しました。", slot + 1));
            }
        }
    }

    /// Dismiss the pending action
    pub fn cancel_confirm(&mut self) {
        if let Some(pending) = self.pending_confirm.take() {
            self.input_mode = pending.return_mode;
        }
    }

    // ==================== Commands ====================

    pub fn enter_command_mode(&mut self) {
        self.command_input.clear();
        self.input_mode = InputMode::Command;
    }

    pub fn exit_input_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command_input.clear();
    }

    /// Parse and execute command from input
    pub fn execute_command(&mut self, store: &mut RecordStore) -> CommandResult {
        let input = self.command_input.trim().to_string();
        self.exit_input_mode();

        let mut parts = input.splitn(2, ' ');
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());

        match (name, arg) {
            ("q" | "quit", _) => return CommandResult::Quit,
            ("today", _) => self.go_today(),
            ("goto", Some(arg)) => {
                let parsed = arg
                    .split_once('-')
                    .and_then(|(y, m)| Some((y.parse::<i32>().ok()?, m.parse::<u32>().ok()?)));
                match parsed {
                    Some((year, month)) if self.go_to_month(year, month) => {}
                    _ => self.set_status(format!("Invalid month: {}", arg)),
                }
            }
            ("export", Some(kind)) => self.export(store, kind),
            ("restore", Some(path)) => self.request_restore(PathBuf::from(path)),
            ("clear", _) => self.request_clear_all(store),
            ("templates", _) => self.open_templates(),
            ("", _) => {}
            _ => self.set_status(format!("Unknown command: {}", input)),
        }

        CommandResult::Done
    }

    /// `export csv [path]` / `export backup [path]`
    pub fn export(&mut self, store: &RecordStore, args: &str) {
        let mut parts = args.splitn(2, ' ');
        let kind = parts.next().unwrap_or_default();
        let out = parts.next().map(|p| PathBuf::from(p.trim()));

        let result = match kind {
            "csv" => export::write_csv(store, &self.config, out),
            "backup" => export::write_backup(store, &self.config, out),
            _ => {
                self.set_status("Usage: export csv|backup [path]");
                return;
            }
        };

        match result {
            Ok(Some(path)) => self.set_status(format!("{} に出力しました", path.display())),
            Ok(None) => self.set_status("出力するデータがありません。"),
            Err(e) => self.set_error(format!("Export failed: {:#}", e)),
        }
    }
}
