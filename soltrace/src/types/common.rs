// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Elementos comunes del modelo

use std::f32::consts::PI;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::utils::wrap_angle;

/// Orientación cardinal de una fachada según su normal exterior
///
/// Los azimuts se miden desde el este (+x del mundo) en sentido antihorario y
/// cada cardinal abarca el cuadrante de π/2 centrado en su dirección
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Este
    #[default]
    E = 0,
    /// Norte
    N = 1,
    /// Oeste
    W = 2,
    /// Sur
    S = 3,
}

impl Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let printable = match *self {
            Orientation::E => "E",
            Orientation::N => "N",
            Orientation::W => "W",
            Orientation::S => "S",
        };
        write!(f, "{}", printable)
    }
}

impl Orientation {
    /// Orientación a partir del ángulo de la normal exterior [rad]
    ///
    /// entra: 0º, gira 45º: 45º, divide por 90º: 0.5, trunca: 0, sale: 0 (este)
    /// entra: 45º, gira 45º: 90º, divide por 90º: 1, trunca: 1, sale: 1 (norte)
    /// entra: 135º, gira 45º: 180º, divide por 90º: 2, trunca: 2, sale: 2 (oeste)
    /// entra: 225º, gira 45º: 270º, divide por 90º: 3, trunca: 3, sale: 3 (sur)
    /// entra: 315º, gira 45º: 360º, divide por 90º: 4, trunca: 4, sale: 0 (este)
    pub fn from_normal_angle(normal_theta: f32) -> Self {
        let theta = wrap_angle(normal_theta);
        match (((theta + PI / 4.0) / (PI / 2.0)).floor() as u32) % 4 {
            0 => Orientation::E,
            1 => Orientation::N,
            2 => Orientation::W,
            _ => Orientation::S,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Asignación de cuadrantes cardinales desde el ángulo de la normal
    #[test]
    fn orientation_from_angle() {
        use Orientation::*;
        assert_eq!(Orientation::from_normal_angle(0.0), E);
        assert_eq!(Orientation::from_normal_angle(PI / 2.0), N);
        assert_eq!(Orientation::from_normal_angle(PI), W);
        assert_eq!(Orientation::from_normal_angle(3.0 * PI / 2.0), S);
        // Los ángulos negativos se normalizan antes de asignar cuadrante
        assert_eq!(Orientation::from_normal_angle(-PI / 2.0), S);
        // Los límites de cuadrante caen del lado del siguiente cardinal
        assert_eq!(Orientation::from_normal_angle(PI / 4.0), N);
        assert_eq!(Orientation::from_normal_angle(PI / 4.0 - 0.01), E);
    }
}
