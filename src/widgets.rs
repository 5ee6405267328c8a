use eframe::egui::{Align2, Color32, FontId, Response, Sense, Ui, Vec2, Widget};

/// The value under a pointer `degrees` clockwise from twelve o'clock, on a
/// dial with `steps` evenly spaced values starting at zero.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn value_at_angle(degrees: f32, steps: u8) -> u8 {
    if steps == 0 {
        return 0;
    }
    let part = 360. / f32::from(steps);
    // round to the nearest mark instead of the one before it
    let index = ((degrees.rem_euclid(360.) + part / 2.) / part).floor() as u32;
    (index % u32::from(steps)) as u8
}

/// A round picker for small counts like hours and minutes.
pub struct Dial<'a> {
    value: &'a mut u8,
    steps: u8,
    hand_color: Option<Color32>,
    radius: Option<f32>,
}

impl<'a> Dial<'a> {
    /// `value` stays in `0..steps`
    pub fn new(value: &'a mut u8, steps: u8) -> Self {
        if *value >= steps {
            *value = steps.saturating_sub(1);
        }
        Self {
            value,
            steps,
            hand_color: None,
            radius: None,
        }
    }

    #[must_use]
    pub const fn radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    #[must_use]
    pub const fn hand_color(mut self, color: Color32) -> Self {
        self.hand_color = Some(color);
        self
    }
}

impl Widget for Dial<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let Self {
            value,
            steps,
            hand_color,
            radius,
        } = self;

        let radius = radius.unwrap_or_else(|| ui.spacing().slider_width / 2.);
        let (rect, mut response) =
            ui.allocate_exact_size(Vec2::splat(radius * 2.), Sense::click_and_drag());
        if response.dragged() || response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                // egui angles start at three o'clock
                let degrees = (pointer - rect.center()).angle().to_degrees() + 90.;
                let picked = value_at_angle(degrees, steps);
                if picked != *value {
                    *value = picked;
                    response.mark_changed();
                }
            }
        }
        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll > 0. {
                *value = (*value + 1) % steps.max(1);
                response.mark_changed();
            } else if scroll < 0. {
                *value = value.checked_sub(1).unwrap_or(steps.saturating_sub(1));
                response.mark_changed();
            }
        }

        let visuals = ui.style().interact(&response);
        let painter = ui.painter();
        painter.circle_filled(rect.center(), radius, visuals.bg_fill);
        let border = visuals.fg_stroke;
        painter.circle_stroke(rect.center(), radius, border);

        let part = 360. / f32::from(steps.max(1));
        let angle = part.mul_add(f32::from(*value), -90.).to_radians();
        let mut hand = visuals.fg_stroke;
        if let Some(color) = hand_color {
            hand.color = color;
        }
        let tip = rect.center() + Vec2::angled(angle) * border.width.mul_add(-2., radius);
        painter.line_segment([rect.center(), tip], hand);
        painter.circle_filled(tip, hand.width * 2., hand.color);
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            format!("{:02}", *value),
            FontId::monospace(radius / 2.),
            visuals.text_color(),
        );
        response
    }
}
