//! Charts module - scales, scatter series and static rendering

mod renderer;
mod scales;
mod scatter;

pub use renderer::{ChartFormat, RenderError, StaticChartRenderer};
pub use scales::{format_tick, Scales};
pub use scatter::{ScatterPoint, ScatterSeries};
