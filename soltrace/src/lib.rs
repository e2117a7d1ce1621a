// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Trazado de rayos de radiación solar directa a escala urbana
//!
//! Calcula, para cada sensor de fachada de cada edificio de un emplazamiento
//! GIS, la serie horaria anual de irradiancia directa de cielo tras descontar
//! el sombreamiento mutuo entre edificios:
//!
//! - el emplazamiento se discretiza en una malla de alturas de 1x1 m a partir
//!   de las aristas de los pies de planta
//! - cada arista recibe columnas de sensores (una posición en planta por tramo
//!   y un sensor por planta del edificio)
//! - cada rayo (sensor, azimut, elevación) recorre la malla y queda obstruido
//!   si algún obstáculo sobresale por encima de su elevación
//! - los rayos que alcanzan el cielo acumulan la irradiancia normal de su
//!   parche, proyectada sobre la fachada, en la serie horaria del sensor
//!
//! El cielo procede de una matriz de parches Tregenza/Reinhart convertida a una
//! subdivisión de paralelos y meridianos (crate sky)

pub mod config;
pub mod results;
pub mod trace;
pub mod types;
pub(crate) mod utils;

pub use config::TraceConfig;
pub use results::{SensorRecord, TraceResults};
pub use trace::{HeightGrid, Hit, Scene, TraceMode, Tracer, VisibilityMask};
pub use types::{
    Building, Edge, Geometry, Orientation, Point2, Site, SiteRecord, Vector2, XYSensor, XYZSensor,
};

/// Versión del programa
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
