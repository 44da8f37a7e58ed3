mod event;
mod image;
mod weather;

pub use event::CalendarEvent;
pub use image::{DashboardImage, DashboardInputs};
pub use weather::{Units, WeatherForecast, WeatherQuery};
