//! Application State
//!
//! The page shell: one tab per resource panel plus the banners tab. Exactly
//! one panel is mounted at a time. The [`Session`] outlives tab switches and
//! owns the client, the shared store and the completion channel that spawned
//! requests report back on.

use crate::api::CmsClient;
use crate::config::Config;
use crate::notification::{DetailLevel, NotificationManager, OperationType};
use crate::panel::{
    execute, settle_unmounted, Command, Completion, Operation, Panel, PanelId, PanelMessage,
    SubmitRefused,
};
use crate::resource::{
    ConfirmConfig, ContentBlock, EmailTemplate, NotificationTemplate, Resource, ResourceKind,
};
use crate::store::ResourceStore;
use crossterm::event::KeyCode;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Run `$body` against whichever typed panel is mounted, binding it to `$panel`
macro_rules! with_panel {
    ($active:expr, $panel:ident => $body:expr) => {
        $crate::app::with_panel!($active, $panel => $body, else Default::default())
    };
    ($active:expr, $panel:ident => $body:expr, else $banner:expr) => {
        match $active {
            $crate::app::ActivePanel::ContentBlocks($panel) => $body,
            $crate::app::ActivePanel::EmailTemplates($panel) => $body,
            $crate::app::ActivePanel::NotificationTemplates($panel) => $body,
            $crate::app::ActivePanel::Banners => $banner,
        }
    };
}
pub(crate) use with_panel;

/// Page tabs, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    ContentBlocks,
    EmailTemplates,
    NotificationTemplates,
    /// Mounted like the others; its content lives elsewhere
    Banners,
}

impl Tab {
    pub const ALL: [Tab; 4] = [
        Tab::ContentBlocks,
        Tab::EmailTemplates,
        Tab::NotificationTemplates,
        Tab::Banners,
    ];

    pub fn key(&self) -> &'static str {
        match self.kind() {
            Some(kind) => kind.key(),
            None => "banners",
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind() {
            Some(kind) => kind.display_name(),
            None => "System Banners",
        }
    }

    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            Tab::ContentBlocks => Some(ResourceKind::ContentBlocks),
            Tab::EmailTemplates => Some(ResourceKind::EmailTemplates),
            Tab::NotificationTemplates => Some(ResourceKind::NotificationTemplates),
            Tab::Banners => None,
        }
    }

    pub fn from_key(key: &str) -> Option<Tab> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Tab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Tab {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Application modes
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,        // Viewing list
    Form,          // Create/edit modal
    Help,          // ? help popup
    Confirm,       // Confirmation dialog
    Warning,       // Warning/info dialog (OK only)
    Describe,      // Viewing JSON details of selected item
    Notifications, // Notifications history panel
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingKind {
    Delete { id: i64, subject: String },
    Import { action: String },
}

/// Pending action that requires confirmation
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub kind: PendingKind,
    pub message: String,
    pub destructive: bool,
    pub selected_yes: bool,
}

/// The mounted panel
pub enum ActivePanel {
    ContentBlocks(Panel<ContentBlock>),
    EmailTemplates(Panel<EmailTemplate>),
    NotificationTemplates(Panel<NotificationTemplate>),
    Banners,
}

/// State that survives tab switches
pub struct Session {
    pub client: CmsClient,
    pub store: ResourceStore,
    pub notifications: NotificationManager,
    /// Notification of each outstanding mutation
    tracked: HashMap<(PanelId, u64), Uuid>,
    tx: UnboundedSender<PanelMessage>,
}

impl Session {
    /// Run a command on a spawned task, tracking mutations as notifications
    pub fn dispatch<R: Resource>(&mut self, command: Command<R>, subject: &str) {
        self.track(&command, subject);
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let completion = execute(&client, command).await;
            if tx.send(R::into_message(completion)).is_err() {
                debug!("Completion channel closed");
            }
        });
    }

    /// Like [`Session::dispatch`], fetching the variable hints alongside
    pub fn dispatch_with_hints<R: Resource>(&mut self, command: Command<R>) {
        self.track(&command, "");
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let (completion, hints) =
                futures::join!(execute(&client, command), client.variables());
            let delivered = tx.send(PanelMessage::VariableHints(hints)).is_ok()
                && tx.send(R::into_message(completion)).is_ok();
            if !delivered {
                debug!("Completion channel closed");
            }
        });
    }

    fn track<R: Resource>(&mut self, command: &Command<R>, subject: &str) {
        let operation_type = match command.request.operation() {
            Operation::List => return,
            Operation::Create => OperationType::Create,
            Operation::Update => OperationType::Update,
            Operation::Delete => OperationType::Delete,
            Operation::Import(action) => OperationType::Import(
                R::def()
                    .action(&action)
                    .map(|a| a.display_name.clone())
                    .unwrap_or(action),
            ),
        };
        let id = self.notifications.create_notification(
            operation_type,
            R::KIND.key().to_string(),
            subject.to_string(),
        );
        self.tracked.insert((command.panel, command.seq), id);
    }

    /// Fold a completion into the mounted panel, or settle it without one
    pub fn settle<R: Resource>(&mut self, mounted: Option<&mut Panel<R>>, completion: Completion<R>) {
        let key = (completion.panel, completion.seq);

        let (follow_up, mutation) = match mounted.filter(|p| p.id() == key.0) {
            Some(panel) => {
                let applied = panel.apply(completion, &mut self.store);
                (applied.follow_up, applied.mutation)
            },
            None => {
                debug!("Completion #{} for unmounted panel {:?}", key.1, key.0);
                (None, settle_unmounted(completion, &mut self.store))
            },
        };

        if let (Some(outcome), Some(id)) = (mutation, self.tracked.remove(&key)) {
            match outcome {
                Ok(summary) => self.notifications.mark_success(id, Some(summary)),
                Err(message) => self.notifications.mark_error(id, message),
            }
        }

        if let Some(command) = follow_up {
            self.dispatch(command, "");
        }
    }
}

/// Main application state
pub struct App {
    pub session: Session,
    rx: UnboundedReceiver<PanelMessage>,

    pub tab: Tab,
    pub active: ActivePanel,
    next_panel_id: u64,

    pub mode: Mode,
    pub pending_action: Option<PendingAction>,
    pub warning_message: Option<String>,

    // Describe view
    pub describe_json: Option<String>,
    pub describe_scroll: usize,

    pub notifications_selected: usize,

    pub config: Config,
    pub readonly: bool,

    // Key press tracking
    pub last_key_press: Option<(KeyCode, Instant)>,
}

impl App {
    pub fn new(client: CmsClient, config: Config, tab: Tab, readonly: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut notifications = NotificationManager::new();
        notifications.detail_level = DetailLevel::from_str(&config.notifications.detail_level);
        notifications.toast_duration = Duration::from_secs(config.notifications.toast_duration_secs);
        notifications.max_history = config.notifications.max_history;

        let session = Session {
            client,
            store: ResourceStore::new(config.cache_ttl()),
            notifications,
            tracked: HashMap::new(),
            tx,
        };

        let mut app = Self {
            session,
            rx,
            tab,
            active: ActivePanel::Banners,
            next_panel_id: 1,
            mode: Mode::Normal,
            pending_action: None,
            warning_message: None,
            describe_json: None,
            describe_scroll: 0,
            notifications_selected: 0,
            config,
            readonly,
            last_key_press: None,
        };
        app.mount(tab);
        app
    }

    // =========================================================================
    // Tabs
    // =========================================================================

    /// Unmount the current panel (dropping unsaved edits) and mount `tab`
    pub fn switch_tab(&mut self, tab: Tab) {
        if tab == self.tab {
            return;
        }
        info!("Switching to tab {}", tab.key());
        self.tab = tab;
        self.mode = Mode::Normal;
        self.pending_action = None;
        self.mount(tab);

        if let Err(e) = self.config.set_last_tab(tab.key()) {
            warn!("Failed to save last tab: {}", e);
        }
    }

    fn mount(&mut self, tab: Tab) {
        let id = PanelId(self.next_panel_id);
        self.next_panel_id += 1;

        self.active = match tab {
            Tab::ContentBlocks => {
                let mut panel = Panel::new(id);
                if let Some(command) = panel.load(&self.session.store) {
                    self.session.dispatch(command, "");
                }
                ActivePanel::ContentBlocks(panel)
            },
            Tab::EmailTemplates => {
                let mut panel = Panel::new(id);
                if let Some(command) = panel.load(&self.session.store) {
                    if self.session.store.variable_hints.is_none() {
                        self.session.dispatch_with_hints(command);
                    } else {
                        self.session.dispatch(command, "");
                    }
                }
                ActivePanel::EmailTemplates(panel)
            },
            Tab::NotificationTemplates => {
                let mut panel = Panel::new(id);
                if let Some(command) = panel.load(&self.session.store) {
                    self.session.dispatch(command, "");
                }
                ActivePanel::NotificationTemplates(panel)
            },
            Tab::Banners => ActivePanel::Banners,
        };
    }

    // =========================================================================
    // Completions
    // =========================================================================

    /// Apply every completion that has arrived since the last call
    pub fn drain_completions(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
        }
        self.sync_mode();
    }

    pub fn handle_message(&mut self, message: PanelMessage) {
        match message {
            PanelMessage::ContentBlocks(completion) => {
                let mounted = match &mut self.active {
                    ActivePanel::ContentBlocks(panel) => Some(panel),
                    _ => None,
                };
                self.session.settle(mounted, completion);
            },
            PanelMessage::EmailTemplates(completion) => {
                let mounted = match &mut self.active {
                    ActivePanel::EmailTemplates(panel) => Some(panel),
                    _ => None,
                };
                self.session.settle(mounted, completion);
            },
            PanelMessage::NotificationTemplates(completion) => {
                let mounted = match &mut self.active {
                    ActivePanel::NotificationTemplates(panel) => Some(panel),
                    _ => None,
                };
                self.session.settle(mounted, completion);
            },
            PanelMessage::VariableHints(Ok(hints)) => {
                debug!("Loaded variable hints for {} categories", hints.len());
                self.session.store.variable_hints = Some(hints);
            },
            PanelMessage::VariableHints(Err(e)) => {
                warn!("Failed to load variable hints: {}", e);
            },
        }
    }

    /// Leave form mode once the form has closed (after a successful submit)
    fn sync_mode(&mut self) {
        let form_open = with_panel!(&self.active, panel => panel.form.is_some(), else false);
        if self.mode == Mode::Form && !form_open {
            self.mode = Mode::Normal;
        }
    }

    // =========================================================================
    // Panel operations
    // =========================================================================

    pub fn has_panel(&self) -> bool {
        !matches!(self.active, ActivePanel::Banners)
    }

    /// Refetch the current view, bypassing the cache
    pub fn refresh(&mut self) {
        let session = &mut self.session;
        with_panel!(&mut self.active, panel => {
            let command = panel.refresh(&session.store);
            session.dispatch(command, "");
        });
    }

    /// Cycle the categorical filter and narrow the server query with it
    pub fn cycle_category(&mut self, forward: bool) {
        with_panel!(&mut self.active, panel => panel.cycle_category(forward));
        self.rescope();
    }

    /// Fetch when the category or committed search changed the server filter
    pub fn rescope(&mut self) {
        let session = &mut self.session;
        with_panel!(&mut self.active, panel => {
            if let Some(command) = panel.rescope(&session.store) {
                session.dispatch(command, "");
            }
        });
    }

    pub fn turn_page(&mut self, forward: bool) {
        let session = &mut self.session;
        with_panel!(&mut self.active, panel => {
            if let Some(command) = panel.turn_page(forward, &session.store) {
                session.dispatch(command, "");
            }
        });
    }

    fn guard_readonly(&mut self) -> bool {
        if self.readonly {
            self.show_warning("Read-only mode: changes are disabled");
        }
        self.readonly
    }

    pub fn open_create(&mut self) {
        if !self.has_panel() || self.guard_readonly() {
            return;
        }
        with_panel!(&mut self.active, panel => panel.open_create());
        self.mode = Mode::Form;
    }

    pub fn open_edit(&mut self) {
        if !self.has_panel() || self.guard_readonly() {
            return;
        }
        if with_panel!(&mut self.active, panel => panel.open_edit(), else false) {
            self.mode = Mode::Form;
        }
    }

    pub fn submit_form(&mut self) {
        let session = &mut self.session;
        let refused = with_panel!(&mut self.active, panel => {
            let subject = panel
                .form
                .as_ref()
                .map(|form| match form.original() {
                    Some(original) => original.display_key(),
                    None => form.values.line(&panel.def().name_field),
                })
                .unwrap_or_default();
            match panel.submit() {
                Ok(command) => {
                    session.dispatch(command, &subject);
                    None
                },
                Err(refused) => Some(refused),
            }
        }, else None);

        match refused {
            Some(SubmitRefused::Unchanged) => self.mode = Mode::Normal,
            Some(SubmitRefused::NoForm) => self.mode = Mode::Normal,
            Some(reason) => debug!("Submit refused: {:?}", reason),
            None => {},
        }
    }

    pub fn close_form(&mut self) {
        if with_panel!(&mut self.active, panel => panel.close_form(), else true) {
            self.mode = Mode::Normal;
        }
    }

    /// Ask before deleting the selected entity
    pub fn request_delete(&mut self) {
        if !self.has_panel() || self.guard_readonly() {
            return;
        }
        let selected = with_panel!(&self.active, panel => {
            panel.selected_item().map(|item| (item.id(), item.display_key()))
        });
        let Some((id, subject)) = selected else {
            return;
        };

        self.enter_confirm_mode(PendingAction {
            message: format!("Delete '{}'?", subject),
            kind: PendingKind::Delete { id, subject },
            destructive: true,
            selected_yes: false,
        });
    }

    /// Run the import action bound to `shortcut`, asking first when the
    /// schema says so. Returns false when no action uses the shortcut.
    pub fn request_action(&mut self, shortcut: char) -> bool {
        let action = with_panel!(&self.active, panel => {
            panel.def().action_by_shortcut(shortcut)
        });
        let Some(action) = action else {
            return false;
        };
        if self.guard_readonly() {
            return true;
        }

        match &action.confirm {
            Some(confirm) => {
                let pending = pending_import(&action.key, &action.display_name, confirm);
                self.enter_confirm_mode(pending);
            },
            None => self.run_pending(PendingKind::Import {
                action: action.key.clone(),
            }),
        }
        true
    }

    /// Execute the pending action if the dialog ended on Yes
    pub fn confirm_pending(&mut self, accepted: bool) {
        if let Some(pending) = self.pending_action.take() {
            if accepted {
                self.run_pending(pending.kind);
            }
        }
        self.exit_mode();
    }

    fn run_pending(&mut self, kind: PendingKind) {
        let session = &mut self.session;
        with_panel!(&mut self.active, panel => match &kind {
            PendingKind::Delete { id, subject } => {
                let command = panel.delete(*id);
                session.dispatch(command, subject);
            },
            PendingKind::Import { action } => {
                if let Some(command) = panel.import(action) {
                    session.dispatch(command, "");
                }
            },
        });
    }

    // =========================================================================
    // Mode Transitions
    // =========================================================================

    pub fn enter_help_mode(&mut self) {
        self.mode = Mode::Help;
    }

    pub fn enter_describe_mode(&mut self) {
        let json = with_panel!(&self.active, panel => panel.selected_json());
        if json.is_some() {
            self.describe_json = json;
            self.describe_scroll = 0;
            self.mode = Mode::Describe;
        }
    }

    pub fn describe_line_count(&self) -> usize {
        self.describe_json
            .as_ref()
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    pub fn describe_scroll_to_bottom(&mut self, visible_lines: usize) {
        self.describe_scroll = self.describe_line_count().saturating_sub(visible_lines);
    }

    pub fn enter_confirm_mode(&mut self, pending: PendingAction) {
        self.pending_action = Some(pending);
        self.mode = Mode::Confirm;
    }

    pub fn show_warning(&mut self, message: &str) {
        self.warning_message = Some(message.to_string());
        self.mode = Mode::Warning;
    }

    pub fn enter_notifications_mode(&mut self) {
        self.notifications_selected = 0;
        self.mode = Mode::Notifications;
    }

    pub fn clear_notifications(&mut self) {
        self.session.notifications.clear();
        self.notifications_selected = 0;
    }

    pub fn exit_mode(&mut self) {
        self.mode = Mode::Normal;
        self.pending_action = None;
        self.warning_message = None;
        self.describe_json = None;
    }
}

fn pending_import(action: &str, display_name: &str, confirm: &ConfirmConfig) -> PendingAction {
    let message = confirm
        .message
        .clone()
        .unwrap_or_else(|| display_name.to_string());
    PendingAction {
        kind: PendingKind::Import {
            action: action.to_string(),
        },
        message: format!("{}?", message),
        destructive: confirm.destructive,
        selected_yes: confirm.default_yes,
    }
}
