// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Sensores de fachada
//!
//! Cada arista recibe una fila de sensores XY en el plano del terreno,
//! separados de la fachada según la normal exterior. Cada sensor XY sostiene
//! una columna de sensores XYZ, uno por planta del edificio

use serde::{Deserialize, Serialize};

use super::Point2;

/// Sensor en el plano del terreno, frente a una arista de fachada
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XYSensor {
    /// Posición en el plano [m]
    pub loc: Point2,
    /// Arista a la que pertenece
    pub parent_edge: usize,
    /// Primer sensor XYZ de la columna
    pub xyz_start: usize,
    /// Número de sensores XYZ de la columna (uno por planta)
    pub xyz_count: u16,
}

/// Sensor de fachada a la altura de una planta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XYZSensor {
    /// Altura sobre rasante [m]
    pub height: f32,
    /// Sensor XY del que cuelga
    pub parent_xy: usize,
    /// Recuento de rayos no obstruidos
    pub rad: u32,
}
