use std::collections::VecDeque;

use chrono::{Local, NaiveDate};
use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use storefront_core::{
    Catalog, CatalogItem, ConnectionPhase, DetailView, ItemId, StorefrontSnapshot,
    TelemetrySnapshot, View,
};

pub struct UiState {
    pub logs: VecDeque<String>,
    pub max_logs: usize,
    pub latest: Option<StorefrontSnapshot>,
    cursor: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            logs: VecDeque::new(),
            max_logs: 8,
            latest: None,
            cursor: 0,
        }
    }
}

impl UiState {
    pub fn push_snapshot(&mut self, snapshot: StorefrontSnapshot) {
        self.latest = Some(snapshot);
    }

    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let mut text: String = line.into();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        if text.is_empty() {
            return;
        }
        self.logs.push_front(text);
        while self.logs.len() > self.max_logs {
            self.logs.pop_back();
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor by `step`, wrapping within `len` entries.
    pub fn move_cursor(&mut self, step: isize, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let current = self.cursor.min(len - 1) as isize;
        self.cursor = (current + step).rem_euclid(len as isize) as usize;
    }
}

pub fn draw_ui(frame: &mut Frame, catalog: &Catalog, state: &UiState) {
    let area = frame.size();
    let Some(snapshot) = state.latest.as_ref() else {
        framed(frame, area, "Greenflwr", vec![Line::from("Opening the storefront...")]);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(5),
            Constraint::Length(10),
        ])
        .split(area);

    draw_header(frame, chunks[0], snapshot);
    if snapshot.menu_open {
        draw_menu(frame, chunks[1], snapshot.screen);
    } else {
        draw_screen(frame, chunks[1], catalog, snapshot, state.cursor());
    }
    draw_commands(frame, chunks[2], snapshot.screen);
    draw_logs(frame, chunks[3], state);
}

/// Resolves the detail pane of a snapshot against the catalog. `None` unless
/// the snapshot shows the detail view of a known item.
pub fn detail_from_snapshot<'a>(
    catalog: &'a Catalog,
    snapshot: &StorefrontSnapshot,
) -> Option<DetailView<'a>> {
    if snapshot.screen != View::Detail {
        return None;
    }
    let item = catalog.get(snapshot.navigation.selected_item.as_ref()?.as_str())?;
    let active_variant = snapshot
        .telemetry
        .as_ref()
        .and_then(|telemetry| telemetry.selected_variant.as_ref())
        .and_then(|id| item.variant(id.as_str()));
    Some(DetailView {
        item,
        owned: snapshot.owned.contains(&item.id),
        active_variant,
    })
}

/// Item ids the cursor walks on the view a snapshot shows.
pub fn cursor_items(catalog: &Catalog, snapshot: &StorefrontSnapshot) -> Vec<ItemId> {
    match snapshot.screen {
        View::Home => catalog
            .new_arrivals()
            .iter()
            .map(|item| item.id.clone())
            .collect(),
        View::Marketplace => snapshot
            .listing
            .as_ref()
            .map(|listing| listing.items.clone())
            .unwrap_or_default(),
        View::Garden => snapshot.owned.clone(),
        View::Detail
        | View::Services
        | View::Blog
        | View::Offers
        | View::Corporate
        | View::Packaging => Vec::new(),
    }
}

fn resolve<'a>(catalog: &'a Catalog, ids: &[ItemId]) -> Vec<&'a CatalogItem> {
    ids.iter().filter_map(|id| catalog.get(id.as_str())).collect()
}

fn framed(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_header(frame: &mut Frame, area: Rect, snapshot: &StorefrontSnapshot) {
    let summary = &snapshot.portfolio;
    let line = Line::from(vec![
        Span::styled(snapshot.screen.label(), Style::default().fg(Color::Green)),
        Span::raw(format!(" | garden {} items", summary.owned_count)),
        Span::raw(format!(" | value ${}", summary.total_value)),
        Span::raw(format!(" | t+{:.1}s", snapshot.at_ms as f64 / 1000.0)),
        Span::raw(" | m menu, q exit"),
    ]);
    framed(frame, area, "Greenflwr", vec![line]);
}

fn draw_menu(frame: &mut Frame, area: Rect, current: View) {
    let lines = View::ALL
        .iter()
        .enumerate()
        .map(|(index, view)| {
            let style = if *view == current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{}", index + 1), Style::default().fg(Color::Yellow)),
                Span::raw("  "),
                Span::styled(view.label(), style),
            ])
        })
        .collect();
    framed(frame, area, "Menu", lines);
}

fn draw_screen(
    frame: &mut Frame,
    area: Rect,
    catalog: &Catalog,
    snapshot: &StorefrontSnapshot,
    cursor: usize,
) {
    match snapshot.screen {
        View::Home => draw_home(frame, area, catalog, cursor),
        View::Marketplace => draw_marketplace(frame, area, catalog, snapshot, cursor),
        View::Detail => match detail_from_snapshot(catalog, snapshot) {
            Some(detail) => draw_detail(frame, area, snapshot.telemetry.as_ref(), detail),
            None => draw_marketplace(frame, area, catalog, snapshot, cursor),
        },
        View::Garden => draw_garden(frame, area, catalog, snapshot, cursor),
        View::Services => draw_services(frame, area),
        View::Blog => draw_blog(frame, area),
        View::Offers => draw_offers(frame, area),
        View::Corporate => draw_corporate(frame, area),
        View::Packaging => draw_packaging(frame, area),
    }
}

fn item_line(item: &CatalogItem, selected: bool) -> Line<'static> {
    let marker = if selected { "> " } else { "  " };
    let name_style = if selected {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(marker),
        Span::styled(format!("{:<22}", item.name), name_style),
        Span::styled(
            format!("{:<8}", item.category.label()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{:<9}", item.stage.label()),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw(format!("${:>6}", item.current_value)),
    ])
}

fn draw_home(frame: &mut Frame, area: Rect, catalog: &Catalog, cursor: usize) {
    let mut lines = vec![Line::from(Span::styled(
        "New arrivals",
        Style::default().fg(Color::Yellow),
    ))];
    lines.extend(
        catalog
            .new_arrivals()
            .iter()
            .enumerate()
            .map(|(index, item)| item_line(item, index == cursor)),
    );
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Best sellers",
        Style::default().fg(Color::Yellow),
    )));
    lines.extend(catalog.best_sellers().iter().map(|item| item_line(item, false)));
    framed(frame, area, "Home", lines);
}

fn draw_marketplace(
    frame: &mut Frame,
    area: Rect,
    catalog: &Catalog,
    snapshot: &StorefrontSnapshot,
    cursor: usize,
) {
    let Some(listing) = snapshot.listing.as_ref() else {
        framed(frame, area, "Shop", vec![Line::from("Listing unavailable.")]);
        return;
    };
    let filter = listing.filter;
    let items = resolve(catalog, &listing.items);
    let mut lines = vec![Line::from(vec![
        Span::raw("category "),
        Span::styled(
            filter.category.map_or("All", |category| category.label()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  stage "),
        Span::styled(
            filter.stage.map_or("All", |stage| stage.label()),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw(format!("  ({} items)", items.len())),
    ])];
    if items.is_empty() {
        lines.push(Line::from("No specimens match these filters."));
    }
    lines.extend(
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| item_line(item, index == cursor)),
    );
    framed(frame, area, "Shop", lines);
}

fn draw_detail(
    frame: &mut Frame,
    area: Rect,
    telemetry: Option<&TelemetrySnapshot>,
    detail: DetailView<'_>,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let item = detail.item;
    let today: NaiveDate = Local::now().date_naive();
    let mut lines = vec![
        Line::from(Span::styled(
            item.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            item.scientific_name.clone(),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
        Line::from(format!(
            "{} | {} | {} | {} days old",
            item.category.label(),
            item.stage.label(),
            item.health.label(),
            item.age_days(today)
        )),
        Line::from(format!(
            "height {}/{} cm ({}% grown)",
            item.height_cm, item.max_height_cm, item.growth_percentage
        )),
        Line::from(format!(
            "value ${} | paid ${} | ROI {:+.1}% | 30d ${}",
            detail.display_value(),
            item.purchase_price,
            detail.roi_percent(),
            item.expected_value_30_days
        )),
        Line::from(format!(
            "water {} | light {}",
            item.care.water_frequency, item.care.sunlight_needs
        )),
        Line::from(if detail.owned {
            Span::styled("In your garden", Style::default().fg(Color::Green))
        } else {
            Span::raw("Not owned")
        }),
    ];
    if let Some(last) = item.value_history.last() {
        lines.push(Line::from(format!(
            "history {} samples, last ${} on {}",
            item.value_history.len(),
            last.value,
            last.date
        )));
    }
    framed(frame, columns[0], "Specimen", lines);

    let mut feed = Vec::new();
    match telemetry {
        Some(session) if session.phase == ConnectionPhase::Live => {
            feed.push(Line::from(Span::styled(
                "LIVE",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
            if let Some(readings) = session.readings.as_ref() {
                feed.push(Line::from(format!(
                    "{:.1} C | {:.0}% humidity | {:.0} lux",
                    readings.temperature_c, readings.humidity_pct, readings.light_lux
                )));
            }
            feed.push(Line::from(format!(
                "camera {} | zoom {:.1}x | {} updates",
                session.camera, session.zoom, session.ticks
            )));
        }
        Some(_) => feed.push(Line::from(Span::styled(
            "Connecting to greenhouse...",
            Style::default().fg(Color::Yellow),
        ))),
        None => feed.push(Line::from("Feed offline")),
    }
    feed.push(Line::from(format!("image {}", detail.display_image())));
    for variant in &item.variants {
        let active = detail
            .active_variant
            .is_some_and(|active| active.id == variant.id);
        let style = if active {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        feed.push(Line::from(Span::styled(
            format!(
                "{} {} {}cm ${} {}% match",
                if active { ">" } else { " " },
                variant.sku,
                variant.height_cm,
                variant.current_value,
                variant.matches
            ),
            style,
        )));
    }
    framed(frame, columns[1], "Live Feed", feed);
}

fn draw_garden(
    frame: &mut Frame,
    area: Rect,
    catalog: &Catalog,
    snapshot: &StorefrontSnapshot,
    cursor: usize,
) {
    let summary = &snapshot.portfolio;
    let mut lines = vec![
        Line::from(format!(
            "value ${} | invested ${} | gain ${} ({:+.1}%)",
            summary.total_value,
            summary.total_invested,
            summary.absolute_gain,
            summary.percent_gain
        )),
        Line::from(format!(
            "offsetting {:.1} kg CO2",
            summary.environmental_offset_kg
        )),
        Line::from(""),
    ];
    let owned = resolve(catalog, &snapshot.owned);
    if owned.is_empty() {
        lines.push(Line::from("Your garden is empty."));
    }
    lines.extend(
        owned
            .into_iter()
            .enumerate()
            .map(|(index, item)| item_line(item, index == cursor)),
    );
    framed(frame, area, "My Garden", lines);
}

fn draw_services(frame: &mut Frame, area: Rect) {
    framed(
        frame,
        area,
        "Garden Services",
        vec![
            Line::from("Home visits, repotting and seasonal care plans."),
            Line::from("Book through the concierge desk."),
        ],
    );
}

fn draw_blog(frame: &mut Frame, area: Rect) {
    framed(
        frame,
        area,
        "Journal",
        vec![Line::from("Growing notes from our greenhouse team.")],
    );
}

fn draw_offers(frame: &mut Frame, area: Rect) {
    framed(
        frame,
        area,
        "Offers",
        vec![Line::from("Seasonal bundles and member pricing.")],
    );
}

fn draw_corporate(frame: &mut Frame, area: Rect) {
    framed(
        frame,
        area,
        "For Business",
        vec![Line::from("Office greening and corporate gifting programs.")],
    );
}

fn draw_packaging(frame: &mut Frame, area: Rect) {
    framed(
        frame,
        area,
        "Packaging",
        vec![
            Line::from("Every specimen ships in compostable, climate-buffered crates."),
            Line::from("Press s to return to the shop."),
        ],
    );
}

fn draw_commands(frame: &mut Frame, area: Rect, view: View) {
    let key = |key: &'static str, text: &'static str| {
        vec![
            Span::styled(key, Style::default().fg(Color::Yellow)),
            Span::raw(text),
        ]
    };
    let mut spans = key("h/s/g", " home/shop/garden  ");
    spans.extend(key("j/k", " move  "));
    spans.extend(key("d", " dump snapshot"));
    let contextual = match view {
        View::Home => key("enter", " open"),
        View::Marketplace => {
            let mut spans = key("enter", " open  ");
            spans.extend(key("c", " category  "));
            spans.extend(key("a", " stage"));
            spans
        }
        View::Detail => {
            let mut spans = key("b/x", " buy/sell  ");
            spans.extend(key("1/2", " camera  "));
            spans.extend(key("+/-", " zoom  "));
            spans.extend(key("[/]", " specimen  "));
            spans.extend(key("p", " packaging  "));
            spans.extend(key("bksp", " back"));
            spans
        }
        View::Garden => {
            let mut spans = key("enter", " open  ");
            spans.extend(key("x", " sell"));
            spans
        }
        View::Services | View::Blog | View::Offers | View::Corporate | View::Packaging => {
            Vec::new()
        }
    };
    framed(
        frame,
        area,
        "Commands",
        vec![Line::from(spans), Line::from(contextual)],
    );
}

fn draw_logs(frame: &mut Frame, area: Rect, state: &UiState) {
    let lines = state
        .logs
        .iter()
        .map(|entry| Line::from(Span::raw(entry.clone())))
        .collect();
    framed(frame, area, "Logs", lines);
}
