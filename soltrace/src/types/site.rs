// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Emplazamiento: tabla GIS de pies de planta de edificios
//!
//! Las coordenadas deben llegar ya en una proyección plana con unidades en
//! metros. El motor no reproyecta

use anyhow::{bail, Error};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Número máximo de edificios admitido
pub const MAX_BUILDINGS: usize = u16::MAX as usize;

/// Geometría de un pie de planta
///
/// Solo se consideran los anillos exteriores de los polígonos. Los anillos
/// pueden venir cerrados (con el primer vértice repetido al final) o abiertos
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    /// Anillo exterior de un polígono simple
    Polygon(Vec<[f64; 2]>),
    /// Anillos exteriores de las partes de un multipolígono
    MultiPolygon(Vec<Vec<[f64; 2]>>),
}

impl Geometry {
    /// Anillos exteriores de la geometría
    pub fn rings(&self) -> Vec<&[[f64; 2]]> {
        match self {
            Geometry::Polygon(ring) => vec![ring.as_slice()],
            Geometry::MultiPolygon(rings) => rings.iter().map(|r| r.as_slice()).collect(),
        }
    }
}

/// Registro GIS de un edificio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Identificador único del edificio
    pub id: String,
    /// Altura sobre rasante [m]
    pub height: f32,
    /// Arquetipo del edificio (categórico)
    pub archetype: String,
    /// Pie de planta
    pub geometry: Geometry,
}

/// Tabla ordenada de pies de planta del emplazamiento
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Site {
    pub records: Vec<SiteRecord>,
}

impl Site {
    /// Lee el emplazamiento desde una cadena JSON
    pub fn from_json(data: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(data)?)
    }

    /// Devuelve el emplazamiento en formato JSON
    pub fn as_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Comprueba la validez de la tabla de entrada
    pub fn validate(&self) -> Result<(), Error> {
        if self.records.len() > MAX_BUILDINGS {
            bail!(
                "Solo se admiten {} edificios y el emplazamiento tiene {}",
                MAX_BUILDINGS,
                self.records.len()
            );
        }
        for record in &self.records {
            if !record.height.is_finite() || record.height <= 0.0 {
                bail!(
                    "Altura inválida ({}) en el edificio \"{}\"",
                    record.height,
                    record.id
                );
            }
        }
        Ok(())
    }

    /// Códigos de arquetipo por orden de aparición
    pub fn archetypes(&self) -> IndexSet<String> {
        self.records
            .iter()
            .map(|r| r.archetype.clone())
            .collect()
    }
}
