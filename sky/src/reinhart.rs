// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Matriz de radiancia por parche de cielo en subdivisión Tregenza/Reinhart
//!
//! El cielo de Tregenza divide la bóveda en 7 bandas de paralelos con
//! [30, 30, 24, 24, 18, 12, 6] parches más un casquete cenital. La subdivisión
//! de Reinhart con factor m parte cada banda en m bandas y cada parche en m
//! trozos, resultando 7·m bandas con m veces más parches cada una.
//!
//! La matriz de entrada tiene una fila por parche y 8760 columnas (una por hora
//! del año). Sigue el orden de los generadores de matrices de cielo tipo
//! gendaymtx: la primera fila es el suelo y la última el cénit, y ambas se
//! descartan en el cálculo. La matriz se genera con el marco de azimut rotado,
//! de modo que el azimut 0 corresponde al este (+x del mundo) y crece en
//! sentido antihorario, hacia el norte.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read};
use std::path::Path;

use anyhow::{bail, Context, Error};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Número de horas de un año de cálculo
pub const HOURS_PER_YEAR: usize = 8760;

/// Parches por banda de paralelo del cielo base de Tregenza, de horizonte a cénit
/// No incluye el casquete cenital
pub const BASE_PATCHES_PER_BAND: [usize; 7] = [30, 30, 24, 24, 18, 12, 6];

/// Parches por banda tras aplicar el factor de subdivisión de Reinhart
///
/// Cada banda base se reparte en m bandas y cada parche se divide en m trozos,
/// de modo que resultan 7·m bandas con m·n parches cada una
pub fn patches_per_band(mfactor: usize) -> Vec<usize> {
    BASE_PATCHES_PER_BAND
        .iter()
        .flat_map(|&n| std::iter::repeat(n * mfactor).take(mfactor))
        .collect()
}

/// Número total de parches de cielo, sin contar suelo ni cénit
pub fn n_sky_patches(mfactor: usize) -> usize {
    patches_per_band(mfactor).iter().sum()
}

/// Matriz de radiancia por parche de cielo y hora del año, W/m²·sr
///
/// Incluye las filas de suelo (primera) y cénit (última), que los consumidores
/// descartan, de modo que tiene `n_sky_patches(mfactor) + 2` filas y 8760 columnas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchMatrix {
    /// Factor de subdivisión de Reinhart
    pub mfactor: usize,
    /// Radiancia de cada parche y hora, W/m²·sr
    pub values: Array2<f32>,
}

impl PatchMatrix {
    /// Construye la matriz validando su forma frente al factor de subdivisión
    pub fn new(mfactor: usize, values: Array2<f32>) -> Result<Self, Error> {
        if mfactor < 1 {
            bail!("Factor de subdivisión de Reinhart inválido: {}", mfactor);
        }
        let expected_rows = n_sky_patches(mfactor) + 2;
        if values.nrows() != expected_rows {
            bail!(
                "Matriz de cielo con {} filas y se esperaban {} (mfactor {}, incluyendo suelo y cénit)",
                values.nrows(),
                expected_rows,
                mfactor
            );
        }
        if values.ncols() != HOURS_PER_YEAR {
            bail!(
                "Matriz de cielo con {} columnas y se esperaban {}",
                values.ncols(),
                HOURS_PER_YEAR
            );
        }
        Ok(Self { mfactor, values })
    }

    /// Lee una matriz de parches en formato de texto
    ///
    /// El formato es el de salida de los generadores de matrices de cielo:
    /// una cabecera de líneas no numéricas y, después, una línea por parche y
    /// hora con las tres componentes RGB de la radiancia, que se promedian
    pub fn from_mtx_text<R: Read>(reader: R, mfactor: usize) -> Result<Self, Error> {
        let expected_rows = n_sky_patches(mfactor) + 2;
        let mut values: Vec<f32> = Vec::with_capacity(expected_rows * HOURS_PER_YEAR);
        let mut in_header = true;
        for (i, line) in BufReader::new(reader).lines().enumerate() {
            let line = line.with_context(|| format!("Error de lectura en la línea {}", i + 1))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Result<Vec<f32>, _> = line.split_whitespace().map(str::parse).collect();
            match fields {
                Ok(rgb) if rgb.len() == 3 => {
                    in_header = false;
                    values.push((rgb[0] + rgb[1] + rgb[2]) / 3.0);
                }
                // Las líneas de cabecera no son tripletas numéricas
                _ if in_header => continue,
                _ => bail!("Línea {} no es una tripleta RGB: \"{}\"", i + 1, line),
            }
        }
        if values.len() != expected_rows * HOURS_PER_YEAR {
            bail!(
                "Se han leído {} valores y se esperaban {} ({} parches x {} horas)",
                values.len(),
                expected_rows * HOURS_PER_YEAR,
                expected_rows,
                HOURS_PER_YEAR
            );
        }
        let values = Array2::from_shape_vec((expected_rows, HOURS_PER_YEAR), values)?;
        Self::new(mfactor, values)
    }

    /// Lee una matriz de parches desde un archivo binario (bincode)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path.as_ref()).with_context(|| {
            format!(
                "No se ha podido abrir el archivo de matriz de cielo \"{}\"",
                path.as_ref().display()
            )
        })?;
        let mtx: PatchMatrix = bincode::deserialize_from(BufReader::new(file))?;
        Self::new(mtx.mfactor, mtx.values)
    }

    /// Guarda la matriz de parches en un archivo binario (bincode)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path.as_ref()).with_context(|| {
            format!(
                "No se ha podido crear el archivo de matriz de cielo \"{}\"",
                path.as_ref().display()
            )
        })?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Recuento de parches del cielo de Tregenza y de sus subdivisiones de Reinhart
    #[test]
    fn patch_counts() {
        assert_eq!(patches_per_band(1), vec![30, 30, 24, 24, 18, 12, 6]);
        assert_eq!(n_sky_patches(1), 144);
        // Con m=2 cada banda base aporta dos bandas con el doble de parches
        assert_eq!(
            patches_per_band(2),
            vec![60, 60, 60, 60, 48, 48, 48, 48, 36, 36, 24, 24, 12, 12]
        );
        // El total crece con el cuadrado del factor de subdivisión
        assert_eq!(n_sky_patches(2), 144 * 4);
        assert_eq!(n_sky_patches(4), 144 * 16);
    }

    /// Validación de forma de la matriz de parches
    #[test]
    fn matrix_shape() {
        let values = Array2::from_elem((146, HOURS_PER_YEAR), 1.0);
        assert!(PatchMatrix::new(1, values.clone()).is_ok());
        assert!(PatchMatrix::new(2, values).is_err());
        let bad = Array2::from_elem((146, 24), 1.0);
        assert!(PatchMatrix::new(1, bad).is_err());
    }

    /// Lectura del formato de texto con cabecera y tripletas RGB
    #[test]
    fn mtx_text_roundtrip() {
        let mut text = String::from("#?RADIANCE\nNROWS=146\nNCOLS=8760\nFORMAT=ascii\n\n");
        for _ in 0..146 * HOURS_PER_YEAR {
            text.push_str("1.0 2.0 3.0\n");
        }
        let mtx = PatchMatrix::from_mtx_text(text.as_bytes(), 1).unwrap();
        assert_eq!(mtx.values.nrows(), 146);
        // Las componentes RGB se promedian
        assert!((mtx.values[[0, 0]] - 2.0).abs() < 1e-6);
        assert!((mtx.values[[145, 8759]] - 2.0).abs() < 1e-6);
    }
}
