// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Malla dispersa de alturas del plano del terreno
//!
//! Cada celda de 1x1 m guarda la altura máxima de las aristas que la cruzan.
//! La altura se almacena como el patrón de bits del f32: las alturas son
//! positivas, de modo que el orden de los patrones coincide con el de los
//! valores y el máximo atómico sobre los bits es el máximo sobre las alturas.
//! Una celda a cero está vacía

use std::f32::consts::FRAC_PI_4;
use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use crate::types::Edge;
use crate::utils::wrap_angle;

use super::scene::Scene;

/// Umbral para considerar nula una componente del vector director
const EPSILON: f32 = 1e-5;

/// Malla de alturas, indexada por celda entera (i, j)
pub struct HeightGrid {
    nx: usize,
    ny: usize,
    cells: Vec<AtomicU32>,
}

impl HeightGrid {
    /// Crea la malla vacía para una escena de width x length metros
    pub fn new(width: f32, length: f32) -> Self {
        let nx = (width.ceil() as usize).max(1);
        let ny = (length.ceil() as usize).max(1);
        let mut cells = Vec::with_capacity(nx * ny);
        cells.resize_with(nx * ny, || AtomicU32::new(0));
        Self { nx, ny, cells }
    }

    /// Crea la malla de una escena y rasteriza sus aristas
    pub fn from_scene(scene: &Scene) -> Self {
        let grid = Self::new(scene.width, scene.length);
        grid.add_edges(&scene.edges);
        grid
    }

    /// Rasteriza las aristas, en paralelo y con máximo atómico por celda
    ///
    /// La operación es conmutativa e idempotente, de modo que el resultado no
    /// depende del orden de los hilos ni de repetir aristas
    pub fn add_edges(&self, edges: &[Edge]) {
        edges.par_iter().for_each(|edge| self.add_edge(edge));
    }

    /// Registra los cruces de una arista con las líneas de la malla
    ///
    /// Recorre los umbrales enteros en x y en y actualizando las dos celdas a
    /// cada lado del cruce, y engrosa una celda más hacia el interior del
    /// recinto según el sector de π/4 de la normal, para que los rayos lanzados
    /// desde sensores pegados al muro no se cuelen por los huecos diagonales de
    /// la escalera de celdas. Las aristas verticales solo recorren la rama de
    /// umbrales en y (y las horizontales la de x), cubriendo las dos columnas
    /// (o filas) que flanquean su línea cuando esta cae sobre una línea de la
    /// malla
    fn add_edge(&self, edge: &Edge) {
        let h = edge.height;
        if h <= 0.0 {
            return;
        }
        let (x0, y0) = (edge.start.x, edge.start.y);
        let (x1, y1) = (edge.end.x, edge.end.y);
        let x_min = x0.min(x1);
        let x_max = x0.max(x1);
        let y_min = y0.min(y1);
        let y_max = y0.max(y1);
        let vertical = edge.slopevec.x.abs() <= EPSILON;
        let horizontal = edge.slopevec.y.abs() <= EPSILON;
        let theta = wrap_angle(edge.normal_theta);

        // Cruces con las líneas verticales de la malla
        if !vertical {
            let x_start = x_min.ceil() as i64;
            let x_end = x_max.floor() as i64;
            for x in x_start..=x_end {
                let y = edge.slope * (x as f32 - x0) + y0;
                let j = y.floor() as i64;
                self.bump(x - 1, j, h);
                self.bump(x, j, h);
                // Una arista horizontal sobre una línea de la malla cubre las filas de ambos lados
                if horizontal && (y - y.floor()).abs() <= EPSILON {
                    self.bump(x - 1, j - 1, h);
                    self.bump(x, j - 1, h);
                }
                // Engrosado hacia el interior
                if theta < FRAC_PI_4 || theta >= 7.0 * FRAC_PI_4 {
                    self.bump(x - 2, j, h);
                } else if (3.0 * FRAC_PI_4..5.0 * FRAC_PI_4).contains(&theta) {
                    self.bump(x + 1, j, h);
                }
            }
        }

        // Cruces con las líneas horizontales de la malla
        if !horizontal {
            // Avance en x por unidad de y
            let inv_slope = edge.slopevec.x / edge.slopevec.y;
            let y_start = y_min.ceil() as i64;
            let y_end = y_max.floor() as i64;
            for y in y_start..=y_end {
                let x = inv_slope * (y as f32 - y0) + x0;
                let i = x.floor() as i64;
                self.bump(i, y - 1, h);
                self.bump(i, y, h);
                // Una arista vertical sobre una línea de la malla cubre las columnas de ambos lados
                if vertical && (x - x.floor()).abs() <= EPSILON {
                    self.bump(i - 1, y - 1, h);
                    self.bump(i - 1, y, h);
                }
                // Engrosado hacia el interior
                if (FRAC_PI_4..3.0 * FRAC_PI_4).contains(&theta) {
                    self.bump(i, y - 2, h);
                } else if (5.0 * FRAC_PI_4..7.0 * FRAC_PI_4).contains(&theta) {
                    self.bump(i, y + 1, h);
                }
            }
        }
    }

    /// Máximo atómico de la altura de una celda, ignorando índices fuera de rango
    fn bump(&self, i: i64, j: i64, height: f32) {
        if i < 0 || j < 0 || i >= self.nx as i64 || j >= self.ny as i64 {
            return;
        }
        let idx = j as usize * self.nx + i as usize;
        self.cells[idx].fetch_max(height.to_bits(), Ordering::Relaxed);
    }

    /// Altura de una celda si está activa
    pub fn height_at(&self, i: i64, j: i64) -> Option<f32> {
        if i < 0 || j < 0 || i >= self.nx as i64 || j >= self.ny as i64 {
            return None;
        }
        let bits = self.cells[j as usize * self.nx + i as usize].load(Ordering::Relaxed);
        if bits == 0 {
            None
        } else {
            Some(f32::from_bits(bits))
        }
    }

    /// Número de celdas activas
    pub fn active_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.load(Ordering::Relaxed) != 0)
            .count()
    }

    /// Dimensiones de la malla en celdas
    pub fn dims(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }
}
