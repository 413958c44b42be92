use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Fixed sidebar width; below this terminal width the sidebar is dropped.
const SIDEBAR_WIDTH: u16 = 24;
const PANEL_WIDTH: u16 = 28;
const MIN_THREE_PANE_WIDTH: u16 = 80;

pub struct ConsoleLayout {
    pub sidebar: Option<Rect>,
    pub center: Rect,
    pub panel: Option<Rect>,
}

/// Split the frame into sidebar, center, and side panel. Narrow terminals
/// collapse to the center column alone so the transcript stays usable.
pub fn three_pane(area: Rect) -> ConsoleLayout {
    if area.width < MIN_THREE_PANE_WIDTH {
        return ConsoleLayout {
            sidebar: None,
            center: area,
            panel: None,
        };
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Min(30),
            Constraint::Length(PANEL_WIDTH),
        ])
        .split(area);
    ConsoleLayout {
        sidebar: Some(chunks[0]),
        center: chunks[1],
        panel: Some(chunks[2]),
    }
}

/// Split the center column into tab bar, transcript, and input line.
pub fn center_rows(area: Rect, input_height: u16) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(input_height),
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

/// Carve the transcript area into up to `count` grid cells, at most
/// `max_cols` across, row-major in tab order.
pub fn grid_cells(area: Rect, count: usize, max_cols: u16) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let cols = (count as u16).min(max_cols.max(1));
    let rows = (count as u16).div_ceil(cols);

    let row_constraints: Vec<Constraint> =
        (0..rows).map(|_| Constraint::Ratio(1, rows as u32)).collect();
    let row_rects = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    let mut cells = Vec::with_capacity(count);
    for row in row_rects.iter() {
        let remaining = count - cells.len();
        let in_this_row = (remaining as u16).min(cols);
        let col_constraints: Vec<Constraint> = (0..in_this_row)
            .map(|_| Constraint::Ratio(1, in_this_row as u32))
            .collect();
        let col_rects = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(col_constraints)
            .split(*row);
        cells.extend(col_rects.iter().copied());
        if cells.len() >= count {
            break;
        }
    }
    cells.truncate(count);
    cells
}
