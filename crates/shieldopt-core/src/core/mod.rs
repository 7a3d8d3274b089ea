pub mod constraints;
pub mod feasibility;
pub mod io;
pub mod kpi;
pub mod materials;
pub mod metadata;
pub mod shield;
pub mod space;
