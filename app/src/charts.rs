use churnguard::insights::{ChartStyle, InsightTable};
use eframe::egui::{self, ecolor::Hsva, Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2};

const CHART_HEIGHT: f32 = 260.0;
const MARGIN: f32 = 28.0;
const LABEL_WIDTH: f32 = 150.0;

/// Colour on a blue-to-red scale for `t` in `[0, 1]`.
pub fn scale_color(t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let hsva = Hsva {
        h: 0.62 * (1.0 - t),
        s: 0.7,
        v: 0.85,
        a: 1.0,
    };
    Color32::from(hsva)
}

/// Position of `value` inside `(lo, hi)`, 0.5 when the range is empty.
pub fn normalize(value: f64, (lo, hi): (f64, f64)) -> f32 {
    if hi > lo {
        ((value - lo) / (hi - lo)) as f32
    } else {
        0.5
    }
}

fn format_value(value: f64) -> String {
    if value.abs() >= 100.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.3}", value)
    }
}

/// Draws `table` in the given style at full available width.
pub fn draw_chart(ui: &mut Ui, table: &InsightTable, style: ChartStyle) {
    if table.rows.is_empty() {
        ui.label("No data");
        return;
    }
    let (response, painter) =
        ui.allocate_painter(Vec2::new(ui.available_width(), CHART_HEIGHT), Sense::hover());
    let frame = response.rect;
    painter.rect_filled(frame, 4.0, ui.visuals().extreme_bg_color);

    match style {
        ChartStyle::Bar => draw_bars(&painter, frame, table, ui.visuals().text_color()),
        ChartStyle::HorizontalBar => draw_horizontal_bars(&painter, frame, table, ui.visuals().text_color()),
        ChartStyle::Line => draw_line(&painter, frame, table, ui.visuals().text_color()),
    }
}

fn draw_bars(painter: &egui::Painter, frame: Rect, table: &InsightTable, text: Color32) {
    let plot = frame.shrink2(Vec2::new(MARGIN, MARGIN));
    let range = table.value_range().unwrap_or((0.0, 1.0));
    let top = range.1.max(f64::EPSILON);
    let slot = plot.width() / table.rows.len() as f32;

    for (i, row) in table.rows.iter().enumerate() {
        let height = (row.value.max(0.0) / top) as f32 * plot.height();
        let x = plot.left() + slot * i as f32;
        let bar = Rect::from_min_max(
            Pos2::new(x + slot * 0.15, plot.bottom() - height),
            Pos2::new(x + slot * 0.85, plot.bottom()),
        );
        painter.rect_filled(bar, 2.0, scale_color(normalize(row.value, range)));
        painter.text(
            Pos2::new(bar.center().x, bar.top() - 2.0),
            Align2::CENTER_BOTTOM,
            format_value(row.value),
            FontId::proportional(11.0),
            text,
        );
        painter.text(
            Pos2::new(bar.center().x, plot.bottom() + 4.0),
            Align2::CENTER_TOP,
            &row.category,
            FontId::proportional(12.0),
            text,
        );
    }
    painter.line_segment(
        [plot.left_bottom(), plot.right_bottom()],
        Stroke::new(1.0, text),
    );
}

/// Rows are drawn bottom-up, so an ascending table puts the largest value on top.
fn draw_horizontal_bars(painter: &egui::Painter, frame: Rect, table: &InsightTable, text: Color32) {
    let plot = Rect::from_min_max(
        Pos2::new(frame.left() + LABEL_WIDTH, frame.top() + MARGIN * 0.5),
        Pos2::new(frame.right() - MARGIN * 2.0, frame.bottom() - MARGIN * 0.5),
    );
    let range = table.value_range().unwrap_or((0.0, 1.0));
    let right = range.1.max(f64::EPSILON);
    let slot = plot.height() / table.rows.len() as f32;

    for (i, row) in table.rows.iter().enumerate() {
        let y = plot.bottom() - slot * (i + 1) as f32;
        let width = (row.value.max(0.0) / right) as f32 * plot.width();
        let bar = Rect::from_min_max(
            Pos2::new(plot.left(), y + slot * 0.15),
            Pos2::new(plot.left() + width, y + slot * 0.85),
        );
        painter.rect_filled(bar, 2.0, scale_color(normalize(row.value, range)));
        painter.text(
            Pos2::new(plot.left() - 6.0, bar.center().y),
            Align2::RIGHT_CENTER,
            &row.category,
            FontId::proportional(11.0),
            text,
        );
        painter.text(
            Pos2::new(bar.right() + 4.0, bar.center().y),
            Align2::LEFT_CENTER,
            format_value(row.value),
            FontId::proportional(10.0),
            text,
        );
    }
    painter.line_segment(
        [plot.left_top(), plot.left_bottom()],
        Stroke::new(1.0, text),
    );
}

fn draw_line(painter: &egui::Painter, frame: Rect, table: &InsightTable, text: Color32) {
    let plot = frame.shrink2(Vec2::new(MARGIN * 1.5, MARGIN));
    let (lo, hi) = table.value_range().unwrap_or((0.0, 1.0));
    let pad = ((hi - lo) * 0.1).max(f64::EPSILON);
    let range = (lo - pad, hi + pad);
    let step = if table.rows.len() > 1 {
        plot.width() / (table.rows.len() - 1) as f32
    } else {
        0.0
    };

    let points: Vec<Pos2> = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Pos2::new(
                plot.left() + step * i as f32,
                plot.bottom() - normalize(row.value, range) * plot.height(),
            )
        })
        .collect();

    let stroke_color = scale_color(0.9);
    painter.add(Shape::line(points.clone(), Stroke::new(2.0, stroke_color)));
    for (point, row) in points.iter().zip(&table.rows) {
        painter.circle_filled(*point, 4.0, stroke_color);
        painter.circle_stroke(*point, 4.0, Stroke::new(1.0, Color32::BLACK));
        painter.text(
            Pos2::new(point.x, plot.bottom() + 4.0),
            Align2::CENTER_TOP,
            &row.category,
            FontId::proportional(12.0),
            text,
        );
    }
    painter.text(
        plot.left_top() - Vec2::new(4.0, 0.0),
        Align2::RIGHT_TOP,
        format_value(range.1),
        FontId::proportional(10.0),
        text,
    );
    painter.text(
        plot.left_bottom() - Vec2::new(4.0, 0.0),
        Align2::RIGHT_BOTTOM,
        format_value(range.0),
        FontId::proportional(10.0),
        text,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(5.0, (0.0, 10.0)), 0.5);
        assert_eq!(normalize(10.0, (0.0, 10.0)), 1.0);
        assert_eq!(normalize(3.0, (3.0, 3.0)), 0.5);
    }

    #[test]
    fn test_scale_color_ends_differ() {
        assert_ne!(scale_color(0.0), scale_color(1.0));
        assert_eq!(scale_color(-1.0), scale_color(0.0));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.3244), "0.324");
        assert_eq!(format_value(91108.54), "91109");
    }
}
