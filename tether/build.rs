use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[cfg(feature = "gl")]
fn generate_gl_bindings(out_dir: &std::path::Path) -> Result<()> {
    use gl_generator::{Api, Fallbacks, Profile, Registry, StructGenerator};
    use std::fs::File;

    let mut file = File::create(out_dir.join("gl_bindings.rs"))?;
    Registry::new(Api::Gl, (4, 5), Profile::Core, Fallbacks::All, ["GL_ARB_gpu_shader_int64"])
        .write_bindings(StructGenerator, &mut file)?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "gl")]
    generate_gl_bindings(&out_dir)?;
    #[cfg(not(feature = "gl"))]
    let _ = out_dir;

    Ok(())
}
