//! Resource Panel
//!
//! A generic table + toolbar + create/edit form for one [`Resource`] type.
//! The panel never talks to the network itself: its operations return
//! [`Command`]s which the page shell runs with [`execute`], and the
//! resulting [`Completion`]s are fed back through [`Panel::apply`].
//!
//! Every command carries the panel id and a per-panel sequence number. Only
//! the most recently issued list request is ever applied, so a slow response
//! can't overwrite a newer one.

pub mod filter;
pub mod form;

pub use filter::ALL_CATEGORIES;
pub use form::{FormMode, FormState};

use crate::api::{ApiError, CmsClient, VariableHints};
use crate::resource::{
    ContentBlock, EmailTemplate, NotificationTemplate, Resource, ResourceDef,
};
use crate::store::ResourceStore;
use serde_json::Value;
use std::ops::Range;
use tracing::{debug, warn};

/// Default viewport height (updated during render based on terminal size)
const DEFAULT_VIEWPORT_HEIGHT: usize = 20;

/// Identity of one mounted panel instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    Loading,
    Loaded,
    LoadError(String),
}

/// What a command does, kept on its completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
    Import(String),
}

impl Operation {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Operation::List)
    }
}

#[derive(Debug)]
pub enum Request<R: Resource> {
    List { filter: R::Filter, generation: u64 },
    Create(R::Create),
    Update { id: i64, payload: R::Update },
    Delete { id: i64 },
    Import { action: String },
}

impl<R: Resource> Request<R> {
    pub fn operation(&self) -> Operation {
        match self {
            Request::List { .. } => Operation::List,
            Request::Create(_) => Operation::Create,
            Request::Update { .. } => Operation::Update,
            Request::Delete { .. } => Operation::Delete,
            Request::Import { action } => Operation::Import(action.clone()),
        }
    }
}

/// A request a panel wants performed
#[derive(Debug)]
pub struct Command<R: Resource> {
    pub panel: PanelId,
    pub seq: u64,
    pub request: Request<R>,
}

#[derive(Debug)]
pub enum Outcome<R: Resource> {
    Listed {
        filter: R::Filter,
        generation: u64,
        items: Vec<R>,
    },
    Created(R),
    Updated(R),
    Deleted(i64),
    Imported {
        action: String,
        count: usize,
    },
}

/// Result of a [`Command`], tagged like the command it answers
#[derive(Debug)]
pub struct Completion<R: Resource> {
    pub panel: PanelId,
    pub seq: u64,
    pub op: Operation,
    pub result: Result<Outcome<R>, ApiError>,
}

/// Everything that comes back over the completion channel
#[derive(Debug)]
pub enum PanelMessage {
    ContentBlocks(Completion<ContentBlock>),
    EmailTemplates(Completion<EmailTemplate>),
    NotificationTemplates(Completion<NotificationTemplate>),
    VariableHints(Result<VariableHints, ApiError>),
}

/// What applying a completion produced for the page shell
#[derive(Debug)]
pub struct Applied<R: Resource> {
    /// Refetch issued after a successful mutation
    pub follow_up: Option<Command<R>>,
    /// How a mutation ended: a summary, or the user-facing error
    pub mutation: Option<Result<String, String>>,
}

impl<R: Resource> Default for Applied<R> {
    fn default() -> Self {
        Self {
            follow_up: None,
            mutation: None,
        }
    }
}

/// Why a submit did not produce a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRefused {
    NoForm,
    InProgress,
    /// Nothing differs from the entity being edited; the form was closed
    Unchanged,
    Invalid(String),
}

pub struct Panel<R: Resource> {
    id: PanelId,
    pub state: PanelState,
    filter: R::Filter,

    items: Vec<R>,
    /// Serialized items, used by search, sort and the table
    rows: Vec<Value>,
    /// Indices into `items` that pass the client-side filters, in display order
    visible: Vec<usize>,

    pub search_text: String,
    pub search_active: bool,
    category: String,
    /// Category values seen in any load, kept while the server filter narrows
    seen_categories: Vec<String>,

    pub sort_column: Option<usize>,
    pub sort_ascending: bool,

    // Navigation
    pub selected: usize,
    pub scroll_offset: usize,
    pub viewport_height: usize,

    pub form: Option<FormState<R>>,

    next_seq: u64,
    latest_list: Option<u64>,
}

impl<R: Resource> Panel<R> {
    pub fn new(id: PanelId) -> Self {
        Self {
            id,
            state: PanelState::Idle,
            filter: R::Filter::default(),
            items: Vec::new(),
            rows: Vec::new(),
            visible: Vec::new(),
            search_text: String::new(),
            search_active: false,
            category: ALL_CATEGORIES.to_string(),
            seen_categories: Vec::new(),
            sort_column: None,
            sort_ascending: true,
            selected: 0,
            scroll_offset: 0,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            form: None,
            next_seq: 1,
            latest_list: None,
        }
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn def(&self) -> &'static ResourceDef {
        R::def()
    }

    pub fn filter(&self) -> &R::Filter {
        &self.filter
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.latest_list.is_some()
    }

    fn command(&mut self, request: Request<R>) -> Command<R> {
        let seq = self.next_seq;
        self.next_seq += 1;
        Command {
            panel: self.id,
            seq,
            request,
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Show the cached collection for the current filter, or ask for it
    pub fn load(&mut self, store: &ResourceStore) -> Option<Command<R>> {
        if let Some(items) = store.get::<R>(&self.filter) {
            debug!("{} served from cache", R::KIND.key());
            self.set_items(items.to_vec());
            self.latest_list = None;
            self.state = PanelState::Loaded;
            return None;
        }
        Some(self.refresh(store))
    }

    /// Fetch the current filter from the server, bypassing the cache
    pub fn refresh(&mut self, store: &ResourceStore) -> Command<R> {
        let command = self.command(Request::List {
            filter: self.filter.clone(),
            generation: store.generation::<R>(),
        });
        self.latest_list = Some(command.seq);
        if self.state != PanelState::Loaded {
            self.state = PanelState::Loading;
        }
        command
    }

    /// Move to the next or previous server page, when the resource pages
    pub fn turn_page(&mut self, forward: bool, store: &ResourceStore) -> Option<Command<R>> {
        let filter = R::page(&self.filter, forward, self.items.len())?;
        self.filter = filter;
        self.state = PanelState::Loading;
        self.selected = 0;
        self.scroll_offset = 0;
        self.load(store)
    }

    /// Push the chosen category and the committed search into the server
    /// filter, fetching when that changes what the server is asked for
    pub fn rescope(&mut self, store: &ResourceStore) -> Option<Command<R>> {
        let category = (self.category != ALL_CATEGORIES).then_some(self.category.as_str());
        let search = Some(self.search_text.trim()).filter(|s| !s.is_empty());
        let scoped = R::scope(&self.filter, category, search);
        if scoped == self.filter {
            return None;
        }
        debug!("{} server filter now {:?}", R::KIND.key(), scoped);
        self.filter = scoped;
        self.selected = 0;
        self.scroll_offset = 0;
        self.load(store)
    }

    fn set_items(&mut self, items: Vec<R>) {
        for item in &items {
            let value = item.category_value();
            if !self.seen_categories.iter().any(|c| c == value) {
                self.seen_categories.push(value.to_string());
            }
        }
        self.rows = items
            .iter()
            .map(|item| serde_json::to_value(item).unwrap_or(Value::Null))
            .collect();
        self.items = items;
        self.apply_filter();
    }

    // =========================================================================
    // Client-side filtering
    // =========================================================================

    pub fn apply_filter(&mut self) {
        let def = R::def();
        self.visible = self
            .items
            .iter()
            .zip(&self.rows)
            .enumerate()
            .filter(|(_, (item, row))| {
                filter::matches_category(item.category_value(), &self.category)
                    && filter::matches_search(row, &def.search_fields, &self.search_text)
            })
            .map(|(i, _)| i)
            .collect();

        if self.sort_column.is_some() {
            self.apply_sort();
        }

        if self.selected >= self.visible.len() {
            self.selected = self.visible.len().saturating_sub(1);
        }
        self.ensure_visible();
    }

    pub fn clear_search(&mut self) {
        self.search_text.clear();
        self.search_active = false;
        self.apply_filter();
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// `all`, the schema presets and every value seen in a loaded collection
    pub fn category_options(&self) -> Vec<String> {
        filter::category_options(
            &R::def().category_presets,
            self.seen_categories.iter().map(String::as_str),
        )
    }

    pub fn set_category(&mut self, category: &str) {
        self.category = category.to_string();
        self.selected = 0;
        self.apply_filter();
    }

    pub fn cycle_category(&mut self, forward: bool) {
        let options = self.category_options();
        let len = options.len();
        let next = match options.iter().position(|o| *o == self.category) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        let next = options[next].clone();
        self.set_category(&next);
    }

    pub fn visible_items(&self) -> impl Iterator<Item = (&R, &Value)> {
        self.visible.iter().map(|&i| (&self.items[i], &self.rows[i]))
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    pub fn sort_by_column(&mut self, column_index: usize) {
        if self.sort_column == Some(column_index) {
            self.sort_ascending = !self.sort_ascending;
        } else {
            self.sort_column = Some(column_index);
            self.sort_ascending = true;
        }
        self.apply_sort();
    }

    fn apply_sort(&mut self) {
        let Some(column) = self.sort_column.and_then(|i| R::def().columns.get(i)) else {
            return;
        };
        let rows = &self.rows;
        let ascending = self.sort_ascending;
        self.visible.sort_by(|&a, &b| {
            let cmp = filter::compare_rows(&rows[a], &rows[b], &column.json_path);
            if ascending {
                cmp
            } else {
                cmp.reverse()
            }
        });
    }

    pub fn clear_sort(&mut self) {
        self.sort_column = None;
        self.apply_filter();
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn selected_item(&self) -> Option<&R> {
        self.visible.get(self.selected).map(|&i| &self.items[i])
    }

    pub fn selected_json(&self) -> Option<String> {
        let row = self.visible.get(self.selected).map(|&i| &self.rows[i])?;
        serde_json::to_string_pretty(row).ok()
    }

    pub fn next(&mut self) {
        if !self.visible.is_empty() {
            self.selected = (self.selected + 1).min(self.visible.len() - 1);
        }
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn go_to_top(&mut self) {
        self.selected = 0;
    }

    pub fn go_to_bottom(&mut self) {
        self.selected = self.visible.len().saturating_sub(1);
    }

    pub fn page_down(&mut self, page_size: usize) {
        if !self.visible.is_empty() {
            self.selected = (self.selected + page_size).min(self.visible.len() - 1);
        }
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
    }

    pub fn update_viewport(&mut self, height: usize) {
        self.viewport_height = height.max(1);
    }

    /// Keep the selected row inside the viewport
    pub fn ensure_visible(&mut self) {
        if self.visible.is_empty() {
            self.scroll_offset = 0;
            return;
        }

        let margin = 2;
        if self.selected < self.scroll_offset + margin {
            self.scroll_offset = self.selected.saturating_sub(margin);
        } else if self.selected >= self.scroll_offset + self.viewport_height.saturating_sub(margin)
        {
            self.scroll_offset = self
                .selected
                .saturating_sub(self.viewport_height.saturating_sub(margin + 1));
        }

        let max_offset = self.visible.len().saturating_sub(self.viewport_height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.scroll_offset + self.viewport_height).min(self.visible.len());
        self.scroll_offset.min(end)..end
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn open_create(&mut self) {
        self.form = Some(FormState::create());
    }

    /// Open the edit form for the selected entity
    pub fn open_edit(&mut self) -> bool {
        match self.selected_item().cloned() {
            Some(entity) => {
                self.form = Some(FormState::edit(entity));
                true
            },
            None => false,
        }
    }

    /// Close the form unless a submission is outstanding
    pub fn close_form(&mut self) -> bool {
        if self.form.as_ref().is_some_and(|f| f.submitting) {
            return false;
        }
        self.form = None;
        true
    }

    /// Validate the open form and turn it into a create or update request
    pub fn submit(&mut self) -> Result<Command<R>, SubmitRefused> {
        let form = self.form.as_mut().ok_or(SubmitRefused::NoForm)?;
        if form.submitting {
            return Err(SubmitRefused::InProgress);
        }

        let request = match Self::build_request(form) {
            Ok(Some(request)) => request,
            Ok(None) => {
                self.form = None;
                return Err(SubmitRefused::Unchanged);
            },
            Err(message) => {
                form.error = Some(message.clone());
                return Err(SubmitRefused::Invalid(message));
            },
        };

        let command = self.command(request);
        if let Some(form) = self.form.as_mut() {
            form.begin_submit(command.seq);
        }
        Ok(command)
    }

    fn build_request(form: &FormState<R>) -> Result<Option<Request<R>>, String> {
        form.validate()?;
        match &form.mode {
            FormMode::Create => Ok(Some(Request::Create(R::create_payload(&form.values)?))),
            FormMode::Edit(original) => {
                let payload = original.update_payload(&form.values)?;
                let unchanged = serde_json::to_value(&payload)
                    .ok()
                    .and_then(|v| v.as_object().map(|o| o.is_empty()))
                    .unwrap_or(false);
                if unchanged {
                    return Ok(None);
                }
                Ok(Some(Request::Update {
                    id: original.id(),
                    payload,
                }))
            },
        }
    }

    pub fn delete(&mut self, id: i64) -> Command<R> {
        self.command(Request::Delete { id })
    }

    /// Run one of the schema's import actions
    pub fn import(&mut self, action: &str) -> Option<Command<R>> {
        let action = R::def().action(action)?;
        Some(self.command(Request::Import {
            action: action.key.clone(),
        }))
    }

    // =========================================================================
    // Completions
    // =========================================================================

    /// Fold a completion for this panel into its state and the store
    pub fn apply(&mut self, completion: Completion<R>, store: &mut ResourceStore) -> Applied<R> {
        let Completion {
            seq, op, result, ..
        } = completion;

        match result {
            Ok(Outcome::Listed {
                filter,
                generation,
                items,
            }) => {
                store.put::<R>(filter.clone(), items.clone(), generation);
                if self.latest_list == Some(seq) && filter == self.filter {
                    self.set_items(items);
                    self.latest_list = None;
                    self.state = PanelState::Loaded;
                } else {
                    debug!("Ignoring superseded {} list #{}", R::KIND.key(), seq);
                }
                Applied::default()
            },
            Err(error) if op == Operation::List => {
                if self.latest_list == Some(seq) {
                    warn!("Failed to list {}: {}", R::KIND.key(), error);
                    self.latest_list = None;
                    self.state = PanelState::LoadError(error.user_message());
                }
                Applied::default()
            },
            Ok(outcome) => {
                let summary = mutation_summary::<R>(&outcome);
                store.invalidate(R::KIND);
                if self
                    .form
                    .as_ref()
                    .is_some_and(|f| f.submit_seq == Some(seq))
                {
                    self.form = None;
                }
                Applied {
                    follow_up: Some(self.refresh(store)),
                    mutation: Some(Ok(summary)),
                }
            },
            Err(error) => {
                let message = error.user_message();
                if let Some(form) = self.form.as_mut().filter(|f| f.submit_seq == Some(seq)) {
                    form.fail(message.clone());
                }
                Applied {
                    follow_up: None,
                    mutation: Some(Err(message)),
                }
            },
        }
    }
}

/// Handle a completion whose panel is no longer mounted: successful mutations
/// still invalidate, everything else is dropped.
pub fn settle_unmounted<R: Resource>(
    completion: Completion<R>,
    store: &mut ResourceStore,
) -> Option<Result<String, String>> {
    if !completion.op.is_mutation() {
        return None;
    }
    match completion.result {
        Ok(outcome) => {
            store.invalidate(R::KIND);
            Some(Ok(mutation_summary::<R>(&outcome)))
        },
        Err(error) => Some(Err(error.user_message())),
    }
}

fn mutation_summary<R: Resource>(outcome: &Outcome<R>) -> String {
    match outcome {
        Outcome::Listed { items, .. } => format!("Loaded {} items", items.len()),
        Outcome::Created(entity) => format!("Created {}", entity.display_key()),
        Outcome::Updated(entity) => format!("Updated {}", entity.display_key()),
        Outcome::Deleted(id) => format!("Deleted #{}", id),
        Outcome::Imported { action, count } => {
            let name = R::def()
                .action(action)
                .map(|a| a.display_name.as_str())
                .unwrap_or(action.as_str());
            format!("{}: {} returned", name, count)
        },
    }
}

/// Perform a command against the API
pub async fn execute<R: Resource>(client: &CmsClient, command: Command<R>) -> Completion<R> {
    let Command {
        panel,
        seq,
        request,
    } = command;
    let op = request.operation();
    debug!("{} #{}: {:?}", R::KIND.key(), seq, op);

    let result = match request {
        Request::List { filter, generation } => R::list(client, &filter)
            .await
            .map(|items| Outcome::Listed {
                filter,
                generation,
                items,
            }),
        Request::Create(payload) => R::create(client, &payload).await.map(Outcome::Created),
        Request::Update { id, payload } => {
            R::update(client, id, &payload).await.map(Outcome::Updated)
        },
        Request::Delete { id } => R::delete(client, id).await.map(|_| Outcome::Deleted(id)),
        Request::Import { action } => R::import(client, &action)
            .await
            .map(|count| Outcome::Imported { action, count }),
    };

    if let Err(error) = &result {
        warn!("{} #{} {:?} failed: {}", R::KIND.key(), seq, op, error);
    }

    Completion {
        panel,
        seq,
        op,
        result,
    }
}
