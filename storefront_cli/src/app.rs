use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossbeam_channel::Receiver as SnapshotReceiver;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use storefront_core::{
    Category, GrowthStage, ItemId, Storefront, StorefrontSnapshot, VariantSelection, View,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::ui::{cursor_items, detail_from_snapshot, draw_ui, UiState};

/// A user intent decoded from one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleMenu,
    Navigate(View),
    CursorUp,
    CursorDown,
    OpenSelected,
    BackToCollection,
    CycleCategory,
    CycleStage,
    Buy,
    Sell,
    Camera(u8),
    ZoomIn,
    ZoomOut,
    NextVariant,
    PreviousVariant,
    Packaging,
    DumpSnapshot,
}

/// Maps a key to an action for the current view. The open menu captures the
/// digit keys as view shortcuts.
pub fn action_for(view: View, menu_open: bool, code: KeyCode) -> Option<Action> {
    if menu_open {
        if let KeyCode::Char(digit @ '1'..='9') = code {
            let index = digit as usize - '1' as usize;
            return View::ALL.get(index).copied().map(Action::Navigate);
        }
    }

    let global = match code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('m') => Some(Action::ToggleMenu),
        KeyCode::Char('h') => Some(Action::Navigate(View::Home)),
        KeyCode::Char('s') => Some(Action::Navigate(View::Marketplace)),
        KeyCode::Char('g') => Some(Action::Navigate(View::Garden)),
        KeyCode::Char('d') => Some(Action::DumpSnapshot),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::CursorUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::CursorDown),
        _ => None,
    };
    if global.is_some() {
        return global;
    }

    match (view, code) {
        (View::Home | View::Marketplace | View::Garden, KeyCode::Enter) => {
            Some(Action::OpenSelected)
        }
        (View::Marketplace, KeyCode::Char('c')) => Some(Action::CycleCategory),
        (View::Marketplace, KeyCode::Char('a')) => Some(Action::CycleStage),
        (View::Garden, KeyCode::Char('x')) => Some(Action::Sell),
        (View::Detail, KeyCode::Backspace) => Some(Action::BackToCollection),
        (View::Detail, KeyCode::Char('b')) => Some(Action::Buy),
        (View::Detail, KeyCode::Char('x')) => Some(Action::Sell),
        (View::Detail, KeyCode::Char('1')) => Some(Action::Camera(1)),
        (View::Detail, KeyCode::Char('2')) => Some(Action::Camera(2)),
        (View::Detail, KeyCode::Char('+') | KeyCode::Char('=')) => Some(Action::ZoomIn),
        (View::Detail, KeyCode::Char('-') | KeyCode::Char('_')) => Some(Action::ZoomOut),
        (View::Detail, KeyCode::Char(']')) => Some(Action::NextVariant),
        (View::Detail, KeyCode::Char('[')) => Some(Action::PreviousVariant),
        (View::Detail, KeyCode::Char('p')) => Some(Action::Packaging),
        _ => None,
    }
}

/// Next value in the "All, then every option" filter cycle.
pub fn cycle<T: Copy + PartialEq>(current: Option<T>, options: &[T]) -> Option<T> {
    match current {
        None => options.first().copied(),
        Some(value) => {
            let position = options.iter().position(|option| *option == value)?;
            options.get(position + 1).copied()
        }
    }
}

pub struct StorefrontApp {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    ui_state: UiState,
    store: Storefront,
    clock: UnboundedReceiver<Duration>,
    snapshots: SnapshotReceiver<StorefrontSnapshot>,
    shutdown_sender: Sender<()>,
    log_receiver: Receiver<String>,
}

impl StorefrontApp {
    pub fn new(
        mut store: Storefront,
        clock: UnboundedReceiver<Duration>,
        shutdown_sender: Sender<()>,
        log_receiver: Receiver<String>,
    ) -> Result<Self> {
        let snapshots = store.subscribe();
        let stdout = std::io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        crossterm::terminal::enable_raw_mode()?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        let mut ui_state = UiState::default();
        ui_state.push_snapshot(store.snapshot());
        Ok(Self {
            terminal,
            ui_state,
            store,
            clock,
            snapshots,
            shutdown_sender,
            log_receiver,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let mut last_draw = Instant::now();

        loop {
            while let Ok(elapsed) = self.clock.try_recv() {
                self.store.advance(elapsed);
            }

            while let Ok(snapshot) = self.snapshots.try_recv() {
                self.ui_state.push_snapshot(snapshot);
            }

            while let Ok(line) = self.log_receiver.try_recv() {
                self.ui_state.push_log(line);
            }

            if last_draw.elapsed() >= Duration::from_millis(100) {
                self.terminal
                    .draw(|frame| draw_ui(frame, self.store.catalog(), &self.ui_state))?;
                last_draw = Instant::now();
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let (view, menu_open) = self
                        .ui_state
                        .latest
                        .as_ref()
                        .map_or((View::Home, false), |snapshot| {
                            (snapshot.screen, snapshot.menu_open)
                        });
                    match action_for(view, menu_open, key.code) {
                        Some(Action::Quit) => break,
                        Some(action) => self.apply(action),
                        None => {}
                    }
                }
            }
        }

        self.terminal.show_cursor()?;
        crossterm::terminal::disable_raw_mode()?;
        let _ = self.shutdown_sender.send(());
        Ok(())
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => {}
            Action::ToggleMenu => {
                self.store.toggle_menu();
            }
            Action::Navigate(view) => {
                self.store.navigate_to(view, None);
                self.ui_state.reset_cursor();
            }
            Action::CursorUp | Action::CursorDown => {
                let len = self.cursor_items().len();
                let step = if action == Action::CursorUp { -1 } else { 1 };
                self.ui_state.move_cursor(step, len);
            }
            Action::OpenSelected => {
                if let Some(id) = self.cursor_items().get(self.ui_state.cursor()).cloned() {
                    self.store.view_item(id.as_str());
                    self.ui_state.reset_cursor();
                }
            }
            Action::BackToCollection => {
                self.store.back_to_collection();
                self.ui_state.reset_cursor();
            }
            Action::CycleCategory => {
                let next = cycle(self.store.listing_filter().category, &Category::ALL);
                self.store.set_category_filter(next);
                self.ui_state.reset_cursor();
            }
            Action::CycleStage => {
                let next = cycle(self.store.listing_filter().stage, &GrowthStage::ALL);
                self.store.set_stage_filter(next);
                self.ui_state.reset_cursor();
            }
            Action::Buy => {
                if let Some(id) = self.detail_item_id() {
                    if self.store.buy(id.as_str()) {
                        self.ui_state.push_log(format!("Planted {id} in your garden"));
                    }
                    self.ui_state.reset_cursor();
                }
            }
            Action::Sell => {
                let target = match self.ui_state.latest.as_ref().map(|snapshot| snapshot.screen) {
                    Some(View::Garden) => self.cursor_items().get(self.ui_state.cursor()).cloned(),
                    _ => self.detail_item_id(),
                };
                if let Some(id) = target {
                    if self.store.sell(id.as_str()) {
                        self.ui_state.push_log(format!("Sold {id}"));
                    }
                    self.ui_state.reset_cursor();
                }
            }
            Action::Camera(index) => {
                self.store.set_camera(index);
            }
            Action::ZoomIn => {
                self.store.zoom_in();
            }
            Action::ZoomOut => {
                self.store.zoom_out();
            }
            Action::NextVariant => self.step_variant(1),
            Action::PreviousVariant => self.step_variant(-1),
            Action::Packaging => {
                self.store.view_packaging();
            }
            Action::DumpSnapshot => {
                let dumped = self.ui_state.latest.as_ref().map(StorefrontSnapshot::to_json);
                match dumped {
                    Some(Ok(json)) => self.ui_state.push_log(json),
                    Some(Err(err)) => warn!("Failed to serialize snapshot: {}", err),
                    None => {}
                }
            }
        }
    }

    fn detail_item_id(&self) -> Option<ItemId> {
        self.ui_state
            .latest
            .as_ref()
            .filter(|snapshot| snapshot.screen == View::Detail)
            .and_then(|snapshot| snapshot.navigation.selected_item.clone())
    }

    /// Item ids the cursor walks on the view last published.
    fn cursor_items(&self) -> Vec<ItemId> {
        self.ui_state
            .latest
            .as_ref()
            .map(|snapshot| cursor_items(self.store.catalog(), snapshot))
            .unwrap_or_default()
    }

    fn step_variant(&mut self, step: isize) {
        let Some(detail) = self
            .ui_state
            .latest
            .as_ref()
            .and_then(|snapshot| detail_from_snapshot(self.store.catalog(), snapshot))
        else {
            return;
        };
        let variants = &detail.item.variants;
        if variants.is_empty() {
            return;
        }
        let current = detail
            .active_variant
            .and_then(|active| variants.iter().position(|variant| variant.id == active.id))
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(variants.len() as isize) as usize;
        let id = variants[next].id.clone();
        if self.store.select_variant(id.as_str()) == VariantSelection::Selected {
            info!(variant = %id, "specimen.selected");
        }
    }
}
