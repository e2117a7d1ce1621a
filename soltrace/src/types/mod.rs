// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Modelo del emplazamiento urbano: edificios, aristas de fachada y sensores
//!
//! Los edificios proceden de un conjunto de pies de planta GIS con altura y
//! arquetipo. Las aristas forman una lista plana sobre la que se apoyan las
//! columnas de sensores, con índices de rango en lugar de referencias

pub use nalgebra::{point, vector};

mod building;
mod common;
mod sensor;
mod site;

pub use building::{Building, Edge};
pub use common::Orientation;
pub use sensor::{XYSensor, XYZSensor};
pub use site::{Geometry, Site, SiteRecord, MAX_BUILDINGS};

/// Punto del plano del terreno [m]
pub type Point2 = nalgebra::Point2<f32>;
/// Vector del plano del terreno
pub type Vector2 = nalgebra::Vector2<f32>;
