// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Compiles the ST VL53LX bare driver and generates its bindings when the
//! `vl53lx` feature is enabled. The driver sources are not redistributed, set
//! `VL53LX_SDK_DIR` to the root of an unpacked STSW-IMG015 (core + platform).

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "vl53lx")]
    vl53lx::build();
}

#[cfg(feature = "vl53lx")]
mod vl53lx {
    use std::{
        env, fs,
        path::{Path, PathBuf},
    };

    fn c_files(dir: &Path) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(dir) else {
            panic!("cannot read {}", dir.display());
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "c"))
            .collect();
        files.sort();
        files
    }

    pub fn build() {
        println!("cargo:rerun-if-env-changed=VL53LX_SDK_DIR");
        let Ok(sdk) = env::var("VL53LX_SDK_DIR") else {
            panic!("the vl53lx feature requires VL53LX_SDK_DIR to point at the ST bare driver");
        };
        let sdk = PathBuf::from(sdk);

        let core = sdk.join("core");
        let platform = sdk.join("platform");
        let includes = [core.join("inc"), platform.join("inc")];

        let mut sources = c_files(&core.join("src"));
        sources.extend(c_files(&platform.join("src")));

        cc::Build::new()
            .files(&sources)
            .includes(&includes)
            .warnings(false)
            .compile("vl53lx");

        let mut builder = bindgen::Builder::default()
            .header(core.join("inc").join("vl53lx_api.h").display().to_string())
            .header(platform.join("inc").join("vl53lx_platform.h").display().to_string())
            .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
            .allowlist_function("VL53LX_.*")
            .allowlist_type("VL53LX_.*")
            .allowlist_var("VL53LX_.*")
            .derive_default(true);
        for include in &includes {
            builder = builder.clang_arg(format!("-I{}", include.display()));
        }

        let bindings = match builder.generate() {
            Ok(bindings) => bindings,
            Err(err) => panic!("unable to generate VL53LX bindings: {}", err),
        };

        let out = PathBuf::from(env::var("OUT_DIR").unwrap_or_default());
        if let Err(err) = bindings.write_to_file(out.join("vl53lx_bindings.rs")) {
            panic!("cannot write VL53LX bindings: {}", err);
        }
    }
}
