//! External collaborators invoked after the engine finalizes a question
//!
//! Everything here runs strictly outside the engine's critical sections:
//! the webhook handler calls these only after `process` has returned a
//! finalized question.

mod answer;
mod intent;
pub mod retry;
mod weather;

pub use answer::{AnswerService, OpenAiAnswer};
pub use intent::{IntentAnalysis, IntentEntity, IntentService};
pub use weather::{CurrentWeather, Forecast, ForecastEntry, Units, WeatherClient};
