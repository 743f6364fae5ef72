//! Domain Services
//!
//! Pure functions over domain data. Nothing here performs I/O; the
//! server's application layer feeds them LLM output and side-process
//! payloads.

pub mod city_codes;
pub mod flight_summary;
pub mod profile_extraction;
pub mod prompts;
pub mod text;
pub mod train_summary;

pub use city_codes::to_iata_city_code;
pub use flight_summary::{duration_to_minutes, parse_flight_summary};
pub use profile_extraction::{
    looks_like_iso_date, parse_profile_update, render_extract_prompt, EXTRACT_PROMPT,
};
pub use prompts::{PromptTemplate, TemplateRegistry};
pub use text::{extract_json_object, truncate_chars};
pub use train_summary::{pick_station_code, seat_available, summarize_trains};
