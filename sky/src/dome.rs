// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Conversión del cielo Tregenza/Reinhart a una subdivisión de paralelos y meridianos
//!
//! Metodología:
//! - al subdividir un parche de radiancia uniforme, la radiancia no cambia
//! - si una banda tiene n parches y queremos N, subdividimos cada parche en
//!   lcm(n, N)/n trozos y agrupamos los trozos de lcm(n, N)/N en lcm(n, N)/N
//! - todos los trozos de una banda tienen el mismo ángulo sólido, de modo que
//!   la media aritmética de cada grupo coincide con la media ponderada por
//!   ángulo sólido, sin necesidad de llevar la cuenta de los ángulos
//!
//! El ángulo sólido de cada parche es trivial a partir de sus paralelos:
//! - L = radiancia, W/m²·sr
//! - Ω = ángulo sólido, sr
//! - E = irradiancia de una superficie normal, W/m² = L·Ω

use std::f32::consts::PI;

use anyhow::{bail, Error};
use log::info;
use ndarray::{s, Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::reinhart::{patches_per_band, PatchMatrix, HOURS_PER_YEAR};

/// Apertura en elevación cubierta por las bandas de parches, sin el casquete cenital (84º)
const DOME_ELEVATION_SPAN: f32 = (90.0 - 6.0) * PI / 180.0;

/// Cielo anual en subdivisión regular de paralelos y meridianos
///
/// Las bandas de elevación van del horizonte hacia el cénit y los meridianos
/// desde el este (+x del mundo) en sentido antihorario. Cada celda guarda la
/// radiancia y la irradiancia de una superficie normal al parche, por hora
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkyDome {
    /// Factor de subdivisión de Reinhart del cielo de origen
    pub mfactor: usize,
    /// Número de meridianos (azimuts) de la subdivisión
    pub n_azimuths: usize,
    /// Número de bandas de elevación, 7·mfactor
    pub n_elevations: usize,
    /// Apertura azimutal de cada parche, 2π/n_azimuths [rad]
    pub azimuthal_aperture: f32,
    /// Apertura en elevación de cada banda [rad]
    pub elevational_aperture: f32,
    /// Elevación del centro de cada banda [rad]
    pub elevation_centers: Vec<f32>,
    /// Azimut del centro de cada meridiano [rad]
    pub azimuth_centers: Vec<f32>,
    /// Ángulo sólido de los parches de cada banda [sr]
    pub solid_angles: Vec<f32>,
    /// Radiancia por banda, meridiano y hora, W/m²·sr, (E, A, 8760)
    pub radiance: Array3<f32>,
    /// Irradiancia de superficie normal por banda, meridiano y hora, W/m², (E, A, 8760)
    pub normal_irradiance: Array3<f32>,
}

impl SkyDome {
    /// Convierte una matriz de parches Tregenza/Reinhart al cielo de paralelos y meridianos
    ///
    /// Descarta las filas de suelo y cénit y remuestrea cada banda al número
    /// de azimuts pedido mediante subdivisión al mínimo común múltiplo
    pub fn from_patch_matrix(mtx: &PatchMatrix, n_azimuths: usize) -> Result<Self, Error> {
        if n_azimuths == 0 {
            bail!("El número de azimuts del cielo debe ser mayor que cero");
        }
        let bands = patches_per_band(mtx.mfactor);
        let n_elevations = bands.len();

        info!(
            "Convirtiendo cielo Reinhart (m={}) a {} bandas x {} azimuts...",
            mtx.mfactor, n_elevations, n_azimuths
        );

        // Parches de cielo, sin el suelo (primera fila) ni el cénit (última)
        let sky_rows = mtx.values.slice(s![1..-1, ..]);

        let mut radiance = Array3::zeros((n_elevations, n_azimuths, HOURS_PER_YEAR));
        let mut row_start = 0;
        for (e, &n_band_patches) in bands.iter().enumerate() {
            let band = sky_rows.slice(s![row_start..row_start + n_band_patches, ..]);
            radiance
                .index_axis_mut(Axis(0), e)
                .assign(&resample_band(band, n_azimuths));
            row_start += n_band_patches;
        }

        let azimuthal_aperture = 2.0 * PI / n_azimuths as f32;
        let elevational_aperture = DOME_ELEVATION_SPAN / n_elevations as f32;
        let elevation_centers: Vec<f32> = (0..n_elevations)
            .map(|e| (e as f32 + 0.5) * elevational_aperture)
            .collect();
        let azimuth_centers: Vec<f32> = (0..n_azimuths)
            .map(|a| (a as f32 + 0.5) * azimuthal_aperture)
            .collect();
        // Todos los parches de una banda comparten ángulo sólido
        let solid_angles: Vec<f32> = (0..n_elevations)
            .map(|e| {
                quad_solid_angle(
                    azimuthal_aperture,
                    elevational_aperture,
                    e as f32 * elevational_aperture,
                )
            })
            .collect();

        // E = L·Ω por parche y hora
        let mut normal_irradiance = radiance.clone();
        for (e, mut band) in normal_irradiance.axis_iter_mut(Axis(0)).enumerate() {
            band *= solid_angles[e];
        }

        Ok(Self {
            mfactor: mtx.mfactor,
            n_azimuths,
            n_elevations,
            azimuthal_aperture,
            elevational_aperture,
            elevation_centers,
            azimuth_centers,
            solid_angles,
            radiance,
            normal_irradiance,
        })
    }
}

/// Remuestrea una banda de (n, 8760) parches a (n_azimuths, 8760)
///
/// Subdivide cada parche en lcm/n trozos de igual radiancia y promedia cada
/// grupo de lcm/n_azimuths trozos. Si n == n_azimuths es la identidad
fn resample_band(band: ArrayView2<f32>, n_azimuths: usize) -> Array2<f32> {
    let n = band.nrows();
    let lcm = lcm(n, n_azimuths);
    let div_factor = lcm / n;
    let grouping_factor = lcm / n_azimuths;

    let mut out = Array2::zeros((n_azimuths, band.ncols()));
    for i in 0..lcm {
        let src = i / div_factor;
        let dst = i / grouping_factor;
        out.row_mut(dst)
            .scaled_add(1.0 / grouping_factor as f32, &band.row(src));
    }
    out
}

/// Ángulo sólido de un parche de cielo, en estereorradianes
///
/// azimuthal_aperture: ángulo entre meridianos [rad]
/// elevational_aperture: ángulo entre paralelos [rad]
/// elevation_start: elevación del paralelo inferior [rad]
pub fn quad_solid_angle(
    azimuthal_aperture: f32,
    elevational_aperture: f32,
    elevation_start: f32,
) -> f32 {
    let elevation_top = elevation_start + elevational_aperture;

    // Cualquier arco sobre un paralelo perpendicular al huso es proporcional
    // a la apertura azimutal del huso
    let lune_frac = azimuthal_aperture / (2.0 * PI);
    // El área de la zona esférica es proporcional a la diferencia de alturas
    // (la esfera completa tiene área 4π y altura 2)
    let zone_frac = (elevation_top.sin() - elevation_start.sin()) / 2.0;

    // El cuadrilátero es la intersección del huso y la zona
    lune_frac * zone_frac * 4.0 * PI
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: usize, b: usize) -> usize {
    a / gcd(a, b) * b
}
