// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

use std::fs::File;
use std::process::exit;

use sky::PatchMatrix;

const APP_TITLE: &str = r#"skyconv"#;
const APP_DESCRIPTION: &str = r#"
Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>

Licencia: Publicado bajo licencia MIT.

"#;
const APP_ABOUT: &str =
    r#"skyconv - conversión de matrices de cielo en texto al formato binario de sky"#;

/// Crea aplicación y detecta opciones seleccionadas
fn start_app_and_get_matches() -> clap::ArgMatches {
    use clap::Arg;
    clap::Command::new(APP_TITLE)
        .bin_name("skyconv")
        .version(env!("CARGO_PKG_VERSION"))
        .about(APP_ABOUT)
        .after_help(APP_DESCRIPTION)
        .arg(
            Arg::new("mfactor")
                .short('m')
                .long("mfactor")
                .value_name("MFACTOR")
                .default_value("1")
                .help("Factor de subdivisión de Reinhart de la matriz de entrada"),
        )
        .arg(
            Arg::new("archivo_entrada")
                .required(true)
                .index(1)
                .value_name("ARCHIVO_ENTRADA")
                .help("Matriz de cielo en formato de texto (tripletas RGB)"),
        )
        .arg(
            Arg::new("archivo_salida")
                .required(true)
                .index(2)
                .value_name("ARCHIVO_SALIDA")
                .help("Archivo binario de salida"),
        )
        .get_matches()
}

fn main() {
    env_logger::init();
    let matches = start_app_and_get_matches();

    let mfactor: usize = match matches.get_one::<String>("mfactor").unwrap().parse() {
        Ok(m) => m,
        Err(_) => {
            eprintln!("ERROR: factor de subdivisión inválido");
            exit(exitcode::DATAERR);
        }
    };
    let input_path = matches.get_one::<String>("archivo_entrada").unwrap();
    let output_path = matches.get_one::<String>("archivo_salida").unwrap();

    let file = match File::open(input_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!(
                "ERROR: no se ha podido abrir el archivo \"{}\": {}",
                input_path, e
            );
            exit(exitcode::NOINPUT);
        }
    };
    let mtx = match PatchMatrix::from_mtx_text(file, mfactor) {
        Ok(mtx) => mtx,
        Err(e) => {
            eprintln!("ERROR: no se ha podido leer la matriz de cielo: {}", e);
            exit(exitcode::DATAERR);
        }
    };
    if let Err(e) = mtx.save(output_path) {
        eprintln!("ERROR: {}", e);
        exit(exitcode::CANTCREAT);
    }
    println!(
        "Guardada matriz de cielo de {} parches en \"{}\"",
        mtx.values.nrows(),
        output_path
    );
}
