// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod fetch;
pub mod format;
pub mod lifecycle;
pub mod record;
pub mod resource;
pub mod schema;
pub mod state;
pub mod table;

pub use fetch::*;
pub use format::*;
pub use lifecycle::*;
pub use record::*;
pub use resource::*;
pub use schema::*;
pub use state::*;
pub use table::*;
