// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Modelo de cielo anual para cálculo de radiación
//!
//! Maneja matrices de radiancia por parche de cielo en la subdivisión de
//! Tregenza/Reinhart y su conversión a una subdivisión regular de paralelos
//! y meridianos, con las radiancias e irradiancias normales por parche y hora

pub mod dome;
pub mod reinhart;

pub use dome::{quad_solid_angle, SkyDome};
pub use reinhart::{n_sky_patches, patches_per_band, PatchMatrix, HOURS_PER_YEAR};

/// Versión del programa
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
