use complex_automaton::{AgentSnapshot, CellSnapshot, RenderSink, SimulationStats};
use piston_window::*;

/// Colour mapping for cell values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// White to saturated yellow.
    Sugar,
    /// Blue through green to red.
    Heat,
}

impl Palette {
    pub fn color(self, value: f64, max_value: f64) -> [f32; 4] {
        let v = if max_value > 0.0 {
            (value / max_value).clamp(0.0, 1.0) as f32
        } else {
            0.0
        };
        match self {
            Palette::Sugar => [1.0, 1.0, 1.0 - v, 1.0],
            Palette::Heat => {
                let (r, g, b) = if v <= 1.0 / 8.0 {
                    (0.0, 0.0, 4.0 * v + 0.5)
                } else if v <= 3.0 / 8.0 {
                    (0.0, 4.0 * v - 0.5, 1.0)
                } else if v <= 5.0 / 8.0 {
                    (4.0 * v - 1.5, 1.0, -4.0 * v + 2.5)
                } else if v <= 7.0 / 8.0 {
                    (1.0, -4.0 * v + 3.5, 0.0)
                } else {
                    (-4.0 * v + 4.5, 0.0, 0.0)
                };
                [r, g, b, 1.0]
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Shape {
    pub color: [f32; 4],
    pub rect: [f64; 4],
    pub round: bool,
}

/// Records a frame as a list of shapes for the window to paint.
#[derive(Debug)]
pub struct PistonView {
    palette: Palette,
    shapes: Vec<Shape>,
    title: String,
}

impl PistonView {
    pub fn new(palette: Palette) -> Self {
        PistonView {
            palette,
            shapes: Vec::new(),
            title: String::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn paint(&self, transform: math::Matrix2d, g: &mut G2d) {
        for shape in &self.shapes {
            if shape.round {
                ellipse(shape.color, shape.rect, transform, g);
            } else {
                rectangle(shape.color, shape.rect, transform, g);
            }
        }
    }
}

impl RenderSink for PistonView {
    fn begin_frame(&mut self) {
        self.shapes.clear();
    }

    fn draw_cell(&mut self, cell: &CellSnapshot, max_value: f64) {
        self.shapes.push(Shape {
            color: self.palette.color(cell.value, max_value),
            rect: [cell.x, cell.y, cell.w, cell.h],
            round: false,
        });
    }

    fn draw_agent(&mut self, agent: &AgentSnapshot) {
        let half = agent.size / 2.0;
        self.shapes.push(Shape {
            color: [0.0, 0.0, 0.0, 1.0],
            rect: [agent.x - half, agent.y - half, agent.size, agent.size],
            round: true,
        });
    }

    fn end_frame(&mut self, stats: &SimulationStats) {
        self.title = format!(
            "Complex Automaton | tick {} | agents {} | births {} deaths {} | mean reserve {:.1}",
            stats.ticks,
            stats.current_population(),
            stats.total_births,
            stats.total_deaths,
            stats.mean_reserve()
        );
    }
}
