// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Construcción de la escena de cálculo
//!
//! Traslada el emplazamiento hasta el origen con un margen, explota los
//! multipolígonos en una lista plana de aristas, calcula sus propiedades
//! geométricas y los pesos de orientación de cada edificio, y reserva los
//! rangos de sensores por arista

use std::f32::consts::PI;

use anyhow::{bail, Error};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TraceConfig;
use crate::types::{point, Building, Edge, Site};
use crate::utils::wrap_angle;

/// Longitud mínima de una arista para entrar en el cómputo de pesos [m]
const MIN_QUALIFIED_LENGTH: f32 = 2.0;
/// Peso mínimo de una arista respecto al perímetro cualificado de su edificio [-]
const MIN_EDGE_WEIGHT: f32 = 0.015;
/// Umbral de longitud para descartar aristas degeneradas [m]
const EPSILON: f32 = 1e-5;

/// Escena de cálculo, en coordenadas trasladadas al origen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Edificios del emplazamiento
    pub buildings: Vec<Building>,
    /// Lista plana de aristas de fachada
    pub edges: Vec<Edge>,
    /// Nombres de arquetipo por código
    pub archetypes: Vec<String>,
    /// Ancho de la escena (eje x) [m]
    pub width: f32,
    /// Largo de la escena (eje y) [m]
    pub length: f32,
    /// Niveles de subdivisión binaria que requiere la dimensión mayor
    pub depth: u32,
    /// Número total de sensores XY reservados
    pub n_xy_sensors: usize,
}

impl Scene {
    /// Construye la escena a partir del emplazamiento y las opciones
    ///
    /// azimuth_inc es la apertura azimutal del cielo, que fija el desfase del
    /// primer rayo de cada arista
    pub fn build(site: &Site, config: &TraceConfig, azimuth_inc: f32) -> Result<Self, Error> {
        site.validate()?;

        let archetype_set = site.archetypes();
        if archetype_set.len() > usize::from(u8::MAX) + 1 {
            bail!(
                "Solo se admiten {} arquetipos y el emplazamiento tiene {}",
                usize::from(u8::MAX) + 1,
                archetype_set.len()
            );
        }

        let padding = 5.0 * f64::from(config.node_width);

        // Caja envolvente del emplazamiento en coordenadas originales
        let mut x_low = f64::INFINITY;
        let mut y_low = f64::INFINITY;
        let mut x_high = f64::NEG_INFINITY;
        let mut y_high = f64::NEG_INFINITY;
        for record in &site.records {
            for ring in record.geometry.rings() {
                for &[x, y] in ring {
                    x_low = x_low.min(x);
                    y_low = y_low.min(y);
                    x_high = x_high.max(x);
                    y_high = y_high.max(y);
                }
            }
        }
        if !x_low.is_finite() {
            // Emplazamiento sin geometría
            x_low = 0.0;
            y_low = 0.0;
            x_high = 0.0;
            y_high = 0.0;
        }
        // Traslación que deja la esquina inferior en (padding, padding)
        let dx = -x_low + padding;
        let dy = -y_low + padding;

        // Edificios
        let mut buildings: Vec<Building> = site
            .records
            .iter()
            .map(|record| Building {
                height: record.height,
                n_floors: config.n_floors(record.height),
                archetype_id: archetype_set.get_index_of(&record.archetype).unwrap() as u8,
                ..Default::default()
            })
            .collect();

        // Lista plana de aristas, explotando los multipolígonos
        let mut edges: Vec<Edge> = Vec::new();
        for (building_ix, record) in site.records.iter().enumerate() {
            let building = &buildings[building_ix];
            for ring in record.geometry.rings() {
                let mut pts: Vec<[f64; 2]> = ring.to_vec();
                // Los anillos cerrados repiten el primer vértice al final
                if pts.len() >= 2 && pts.first() == pts.last() {
                    pts.pop();
                }
                if pts.len() < 3 {
                    warn!(
                        "Anillo degenerado con {} vértices en el edificio \"{}\"",
                        pts.len(),
                        record.id
                    );
                    continue;
                }
                // Orientamos los anillos en sentido antihorario para que las
                // normales por producto vectorial apunten al exterior
                if signed_area(&pts) < 0.0 {
                    debug!(
                        "Anillo horario en el edificio \"{}\", se invierte",
                        record.id
                    );
                    pts.reverse();
                }
                for k in 0..pts.len() {
                    let [x0, y0] = pts[k];
                    let [x1, y1] = pts[(k + 1) % pts.len()];
                    let start = point![(x0 + dx) as f32, (y0 + dy) as f32];
                    let end = point![(x1 + dx) as f32, (y1 + dy) as f32];
                    if (end - start).norm() < EPSILON {
                        warn!(
                            "Arista de longitud nula en el edificio \"{}\", se descarta",
                            record.id
                        );
                        continue;
                    }
                    edges.push(Edge::new(
                        building_ix as u16,
                        start,
                        end,
                        building.height,
                        building.n_floors,
                    ));
                }
            }
        }

        // Propiedades geométricas derivadas, en paralelo sobre aristas
        edges
            .par_iter_mut()
            .for_each(|edge| edge.update_properties(azimuth_inc));

        // Rangos de aristas por edificio (se generan en orden de edificio)
        let mut edge_counts = vec![0usize; buildings.len()];
        for edge in &edges {
            edge_counts[edge.building_id as usize] += 1;
        }
        let mut cursor = 0;
        for (building, count) in buildings.iter_mut().zip(edge_counts) {
            building.edge_start = cursor;
            cursor += count;
            building.edge_end = cursor;
        }

        compute_edge_orientation_weights(&mut buildings, &mut edges);

        // Sensores por arista, con sumas prefijas para los rangos
        let mut sensor_cursor = 0usize;
        for edge in edges.iter_mut() {
            edge.sensor_start = sensor_cursor;
            sensor_cursor += sensor_count(edge.length(), config);
            edge.sensor_end = sensor_cursor;
        }

        // Caja de la escena trasladada y profundidad de subdivisión binaria
        let width = (x_high - x_low + 2.0 * padding) as f32;
        let length = (y_high - y_low + 2.0 * padding) as f32;
        let max_dim = width.max(length);
        let min_nodes = (max_dim / config.node_width).ceil();
        let depth = min_nodes.log2().ceil() as u32;
        if depth >= 16 {
            bail!(
                "Solo se admiten mallas con profundidad < 16 y la caja {:.0}x{:.0} requiere {}",
                width,
                length,
                depth
            );
        }

        info!("Edificios: {}", buildings.len());
        info!("Aristas: {}", edges.len());
        info!("Sensores XY previstos: {}", sensor_cursor);
        info!("Profundidad de la malla: {}", depth);

        Ok(Scene {
            buildings,
            edges,
            archetypes: archetype_set.into_iter().collect(),
            width,
            length,
            depth,
            n_xy_sensors: sensor_cursor,
        })
    }
}

/// Área con signo de un anillo (positiva en sentido antihorario)
fn signed_area(ring: &[[f64; 2]]) -> f64 {
    let mut area = 0.0;
    for k in 0..ring.len() {
        let [x0, y0] = ring[k];
        let [x1, y1] = ring[(k + 1) % ring.len()];
        area += x0 * y1 - x1 * y0;
    }
    area / 2.0
}

/// Número de sensores de una arista según su longitud
///
/// El primer y el último sensor se retranquean sensor_inset de los extremos
fn sensor_count(length: f32, config: &TraceConfig) -> usize {
    let q = (length - 2.0 * config.sensor_inset) / config.sensor_spacing;
    let n = q.floor() + 1.0;
    if n >= 1.0 {
        n as usize
    } else {
        0
    }
}

/// Cualificación de aristas y pesos de orientación de cada edificio
///
/// Las aristas menores de 2 m no cuentan para los pesos, y las que pesan menos
/// del 1,5% del perímetro cualificado se eliminan. Tras la poda se renormalizan
/// los pesos de arista de cada edificio y sus cuatro pesos cardinales
fn compute_edge_orientation_weights(buildings: &mut [Building], edges: &mut [Edge]) {
    // Longitud cualificada, en paralelo sobre aristas
    edges.par_iter_mut().for_each(|edge| {
        let length = edge.length();
        edge.qualified_length = if length < MIN_QUALIFIED_LENGTH {
            0.0
        } else {
            length
        };
    });

    // Acumulación de pesos cardinales y perímetro sobre cada edificio
    for edge in edges.iter() {
        let building = &mut buildings[edge.building_id as usize];
        let (north, east, south, west) = cardinal_weights(edge.normal_theta);
        let ql = edge.qualified_length;
        building.north_weight += north * ql;
        building.east_weight += east * ql;
        building.south_weight += south * ql;
        building.west_weight += west * ql;
        building.qualified_perim_length += ql;
    }

    // Peso de cada arista respecto al perímetro cualificado, con poda
    {
        let buildings_ref = &*buildings;
        edges.par_iter_mut().for_each(|edge| {
            let perim = buildings_ref[edge.building_id as usize].qualified_perim_length;
            let mut weight = if perim > 0.0 {
                edge.qualified_length / perim
            } else {
                0.0
            };
            if weight < MIN_EDGE_WEIGHT {
                weight = 0.0;
            }
            edge.weight = weight;
        });
    }

    for edge in edges.iter() {
        buildings[edge.building_id as usize].qualified_edge_weight_sum += edge.weight;
    }

    // Renormalización tras eliminar las aristas de poco peso
    {
        let buildings_ref = &*buildings;
        edges.par_iter_mut().for_each(|edge| {
            let weight_sum = buildings_ref[edge.building_id as usize].qualified_edge_weight_sum;
            if weight_sum > 0.0 {
                edge.weight /= weight_sum;
            }
        });
    }

    // Normalización de los pesos cardinales de cada edificio
    buildings.par_iter_mut().for_each(|building| {
        let weight_sum = building.north_weight
            + building.east_weight
            + building.south_weight
            + building.west_weight;
        if weight_sum > 0.0 {
            building.north_weight /= weight_sum;
            building.east_weight /= weight_sum;
            building.south_weight /= weight_sum;
            building.west_weight /= weight_sum;
        }
    });
}

/// Reparto del peso de una arista entre los dos cardinales que encuadran su normal
///
/// normal_theta = 0 corresponde al este y crece en sentido antihorario.
/// Devuelve (norte, este, sur, oeste)
fn cardinal_weights(normal_theta: f32) -> (f32, f32, f32, f32) {
    let theta = wrap_angle(normal_theta);
    let quarter = PI / 2.0;
    let (mut north, mut east, mut south, mut west) = (0.0, 0.0, 0.0, 0.0);
    if theta <= quarter {
        // norte y este
        north = theta / quarter;
        east = 1.0 - north;
    } else if theta <= PI {
        // norte y oeste
        north = (PI - theta) / quarter;
        west = 1.0 - north;
    } else if theta <= 3.0 * quarter {
        // sur y oeste
        south = (theta - PI) / quarter;
        west = 1.0 - south;
    } else {
        // sur y este
        south = (2.0 * PI - theta) / quarter;
        east = 1.0 - south;
    }
    (north, east, south, west)
}
