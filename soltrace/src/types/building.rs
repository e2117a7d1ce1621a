// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Edificios y aristas de fachada
//!
//! Cada edificio referencia sus aristas por rango dentro de la lista plana de
//! la escena y acumula los pesos de orientación de su perímetro cualificado

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::{vector, Orientation, Point2, Vector2};

/// Edificio del modelo
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Building {
    /// Altura sobre rasante [m]
    pub height: f32,
    /// Número de plantas
    pub n_floors: u16,
    /// Código de arquetipo
    pub archetype_id: u8,
    /// Primera arista del edificio en la lista plana de la escena
    pub edge_start: usize,
    /// Última arista del edificio (excluida)
    pub edge_end: usize,
    /// Peso de la orientación norte [-]
    pub north_weight: f32,
    /// Peso de la orientación este [-]
    pub east_weight: f32,
    /// Peso de la orientación sur [-]
    pub south_weight: f32,
    /// Peso de la orientación oeste [-]
    pub west_weight: f32,
    /// Perímetro cualificado, descontando aristas cortas [m]
    pub qualified_perim_length: f32,
    /// Suma de pesos de aristas cualificadas antes de renormalizar [-]
    pub qualified_edge_weight_sum: f32,
}

/// Arista de fachada de un edificio
///
/// Se crea una por tramo del anillo exterior de cada pie de planta, tras la
/// explosión de multipolígonos, y no se modifica tras el cálculo de propiedades
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Edificio al que pertenece
    pub building_id: u16,
    /// Vértice inicial [m]
    pub start: Point2,
    /// Vértice final [m]
    pub end: Point2,
    /// Vector director unitario
    pub slopevec: Vector2,
    /// Pendiente dy/dx (±inf en aristas verticales)
    pub slope: f32,
    /// Normal exterior unitaria
    pub normal: Vector2,
    /// Ángulo de la normal exterior [rad]
    pub normal_theta: f32,
    /// Azimut del primer rayo de los sensores de la arista [rad]
    pub az_start_angle: f32,
    /// Orientación cardinal de la fachada
    pub orientation: Orientation,
    /// Altura heredada del edificio [m]
    pub height: f32,
    /// Fracción del perímetro cualificado del edificio [-]
    pub weight: f32,
    /// Longitud de la arista, o 0 si no alcanza la longitud mínima [m]
    pub qualified_length: f32,
    /// Plantas heredadas del edificio
    pub n_floors: u16,
    /// Primer sensor XY de la arista
    pub sensor_start: usize,
    /// Último sensor XY de la arista (excluido)
    pub sensor_end: usize,
}

impl Edge {
    /// Crea una arista pendiente del cálculo de propiedades geométricas
    pub(crate) fn new(
        building_id: u16,
        start: Point2,
        end: Point2,
        height: f32,
        n_floors: u16,
    ) -> Self {
        Self {
            building_id,
            start,
            end,
            slopevec: vector![0.0, 0.0],
            slope: 0.0,
            normal: vector![0.0, 0.0],
            normal_theta: 0.0,
            az_start_angle: 0.0,
            orientation: Orientation::E,
            height,
            weight: 0.0,
            qualified_length: 0.0,
            n_floors,
            sensor_start: 0,
            sensor_end: 0,
        }
    }

    /// Longitud de la arista [m]
    pub fn length(&self) -> f32 {
        (self.end - self.start).norm()
    }

    /// Número de sensores XY de la arista
    pub fn sensor_count(&self) -> usize {
        self.sensor_end - self.sensor_start
    }

    /// Calcula las propiedades geométricas derivadas de los vértices
    ///
    /// La normal exterior es el producto vectorial del vector director con +z,
    /// que apunta fuera del recinto en anillos con vértices en sentido antihorario.
    /// El azimut del primer rayo se retrasa π/2 respecto a la normal y se
    /// desplaza media apertura para que ningún rayo sea paralelo a la arista
    pub(crate) fn update_properties(&mut self, azimuth_inc: f32) {
        let slopevec = (self.end - self.start).normalize();
        // slopevec x +z = (dy, -dx)
        let normal = vector![slopevec.y, -slopevec.x];
        let normal_theta = normal.y.atan2(normal.x);
        self.slopevec = slopevec;
        self.slope = slopevec.y / slopevec.x;
        self.normal = normal;
        self.normal_theta = normal_theta;
        self.orientation = Orientation::from_normal_angle(normal_theta);
        self.az_start_angle = normal_theta - PI / 2.0 + azimuth_inc / 2.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::point;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert_almost_eq!($a, $b, 0.001)
        };
        ($a:expr, $b:expr, $c:expr) => {
            if ($a - $b).abs() > $c {
                panic!(
                    "assertion failed: `abs(left - right) < {}`, (left: `{}`, right: `{}`)",
                    $c, $a, $b
                );
            }
        };
    }

    /// Normales exteriores de un cuadrado con vértices en sentido antihorario
    #[test]
    fn outward_normals_ccw_square() {
        let pts = [
            point![0.0, 0.0],
            point![10.0, 0.0],
            point![10.0, 10.0],
            point![0.0, 10.0],
        ];
        let expected_normals = [
            vector![0.0, -1.0],
            vector![1.0, 0.0],
            vector![0.0, 1.0],
            vector![-1.0, 0.0],
        ];
        let expected_orientations = [
            Orientation::S,
            Orientation::E,
            Orientation::N,
            Orientation::W,
        ];
        for k in 0..4 {
            let mut edge = Edge::new(0, pts[k], pts[(k + 1) % 4], 10.0, 3);
            edge.update_properties(0.25);
            assert_almost_eq!(edge.normal.x, expected_normals[k].x, 1e-6);
            assert_almost_eq!(edge.normal.y, expected_normals[k].y, 1e-6);
            assert_eq!(edge.orientation, expected_orientations[k]);
            // El primer rayo queda retrasado π/2 menos media apertura respecto a la normal
            assert_almost_eq!(
                edge.az_start_angle,
                edge.normal_theta - PI / 2.0 + 0.125,
                1e-6
            );
        }
    }

    /// La pendiente de una arista vertical desborda a infinito sin fallar
    #[test]
    fn vertical_edge_slope() {
        let mut edge = Edge::new(0, point![5.0, 0.0], point![5.0, 10.0], 10.0, 3);
        edge.update_properties(0.25);
        assert!(edge.slope.is_infinite());
        assert_almost_eq!(edge.normal.x, 1.0, 1e-6);
        assert_almost_eq!(edge.normal.y, 0.0, 1e-6);
    }
}
