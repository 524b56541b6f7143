use std::fs;
use std::path::Path;
use std::process::Command;

use tinycompute::transpile::{
    transpile_file, KernelStatus, Options, EXIT_FATAL, EXIT_KERNEL_FAILED, EXIT_OK,
};

const GAME_OF_LIFE: &str = r#"#pragma once

#include <iostream>
#include "vec.hpp"
#include "computebackend.hpp"

struct [[clang::annotate("kernel")]] GameOfLifeKernel
{
	static constexpr char fileLocation[] = "gol_v4";

	tc::uvec3 local_size{ 4, 4, 1 };
	tc::BufferBinding<tc::uint, 0, 0> inData;
	tc::BufferBinding<tc::uint, 1, 0> outData;

	tc::Uniform<tc::integer, 1> width{ 16 };
	tc::Uniform<tc::integer, 2> height{ 16 };
	tc::Uniform<tc::integer, 3> pad{ 1 };

	int coordinateToIndex(int cx, int cy) {
		return (cy + pad) * (width + pad) + (cx + pad);
	}

	void main() {
		using namespace tc;
		uint n = 0;
		uvec2 cr = gl_GlobalInvocationID["xy"_sw];
		int cellIndex = coordinateToIndex(cr.x, cr.y);
		uint alive = inData[cellIndex];

		// convolution
		for (int dy = -1; dy <= 1; ++dy)
		{
			for (int dx = -1; dx <= 1; ++dx)
			{
				if (dy || dx) {
					n += inData[coordinateToIndex(cr.x + dx, cr.y + dy)];
				}
			}
		}
		outData[cellIndex] = (n == 3) || (alive && n == 2);
	}

	void _printToConsole()
	{
		for (int r = 0; r < width; ++r) {
			for (int c = 0; c < height; ++c)
			{
				int idx = coordinateToIndex(c, r);
				switch (outData[idx])
				{
				case 0: std::cout << "\033[1;47m  \033[0m"; break;
				case 1: std::cout << "\033[1;42m  \033[0m"; break;
				}
			}
			std::cout << "\n";
		}
		std::cout << "\n";
	}
};
"#;

const FLOAT_ADDER: &str = r#"struct [[clang::annotate("kernel")]] FloatAdder
{
    static constexpr char fileLocation[] = "add_floats";
    tc::uvec3 local_size{64, 1, 1};
    tc::BufferBinding<float, 0> lhs;
    tc::BufferBinding<float, 1> rhs;
    tc::BufferBinding<float, 2> sum;

    void main()
    {
        tc::uint i = gl_GlobalInvocationID.x;
        sum[i] = lhs[i] + rhs[i];
    }
};
"#;

const ALLOCATING: &str = r#"struct [[clang::annotate("kernel")]] Leaky
{
    static constexpr char fileLocation[] = "leaky";
    tc::BufferBinding<tc::uint, 0> data;

    void main()
    {
        tc::uint* scratch = new tc::uint[16];
        data[0] = scratch[0];
    }
};
"#;

/// Write `source` as `kernels.h` in a fresh directory and return both.
fn setup(source: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("kernels.h");
    fs::write(&input, source).unwrap();
    (dir, input)
}

fn options_into(dir: &Path) -> Options {
    Options {
        output_dir: dir.join("out"),
        ..Options::default()
    }
}

fn tinycompute(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tinycompute"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_game_of_life_end_to_end() {
    let (dir, input) = setup(GAME_OF_LIFE);
    let report = transpile_file(&input, &options_into(dir.path())).unwrap();
    assert_eq!(report.exit_code(), EXIT_OK);
    assert_eq!(report.outcomes.len(), 1);

    let path = dir.path().join("out").join("gol_v4.comp");
    assert_eq!(report.outcomes[0].status, KernelStatus::Emitted(path.clone()));
    let shader = fs::read_to_string(&path).unwrap();

    assert!(shader.starts_with("#version 430\n"));
    assert!(!shader.contains('\r'));
    assert_eq!(shader.matches(") buffer _").count(), 2, "{}", shader);
    assert!(shader.contains("layout(set=0, binding=0) buffer _inDataLayout { uint inData[]; };"));
    assert!(shader.contains("layout(set=0, binding=1) buffer _outDataLayout { uint outData[]; };"));
    assert_eq!(
        shader
            .lines()
            .filter(|l| l.contains("local_size_x=4, local_size_y=4, local_size_z=1"))
            .count(),
        1
    );
    assert!(shader.contains("layout(location=1) uniform int width;"));
    assert!(shader.contains("uvec2 cr = gl_GlobalInvocationID.xy;"));
    assert!(shader.contains("outData[cellIndex] = uint( "));

    // Host-only constructs are gone.
    assert!(!shader.contains("tc::"));
    assert!(!shader.contains("_sw"));
    assert!(!shader.contains("[\""));
    assert!(!shader.contains("fileLocation"));
    assert!(!shader.contains("_printToConsole"));
    assert!(!shader.contains("std::cout"));
    for brace_ctor in ["vec2{", "vec3{", "vec4{"] {
        assert!(!shader.contains(brace_ctor), "{}", brace_ctor);
    }
}

#[test]
fn test_float_adder_shader_text() {
    let (dir, input) = setup(FLOAT_ADDER);
    let report = transpile_file(&input, &options_into(dir.path())).unwrap();
    assert_eq!(report.exit_code(), EXIT_OK);
    assert!(report.diagnostics().next().is_none());

    let shader = fs::read_to_string(dir.path().join("out").join("add_floats.comp")).unwrap();
    let lines: Vec<&str> = shader.lines().map(str::trim_end).collect();
    insta::assert_snapshot!(lines.join("\n"), @r"
    #version 430

        layout(local_size_x=64, local_size_y=1, local_size_z=1) in;
        layout(set=0, binding=0) buffer _lhsLayout { float lhs[]; };
        layout(set=0, binding=1) buffer _rhsLayout { float rhs[]; };
        layout(set=0, binding=2) buffer _sumLayout { float sum[]; };

        void main()
        {
            uint i = gl_GlobalInvocationID.x;
            sum[i] = lhs[i] + rhs[i];
        }
    ");
}

#[test]
fn test_allocating_kernel_produces_no_file() {
    let source = format!("{}\n{}", ALLOCATING, FLOAT_ADDER);
    let (dir, input) = setup(&source);
    let report = transpile_file(&input, &options_into(dir.path())).unwrap();

    assert_eq!(report.exit_code(), EXIT_KERNEL_FAILED);
    assert_eq!(report.outcomes[0].status, KernelStatus::Rejected);
    assert!(report.outcomes[0]
        .diagnostics
        .iter()
        .any(|d| d.is_error() && d.message.contains("'new'")));
    assert!(!dir.path().join("out").join("leaky.comp").exists());
    // The other kernel is still emitted.
    assert!(dir.path().join("out").join("add_floats.comp").exists());
}

#[test]
fn test_cli_exit_codes() {
    let (dir, good) = setup(FLOAT_ADDER);
    let out = dir.path().join("shaders");
    let out_arg = out.to_str().unwrap();

    let ok = tinycompute(&["transpile", good.to_str().unwrap(), "-o", out_arg]);
    assert_eq!(ok.status.code(), Some(EXIT_OK));
    assert!(String::from_utf8_lossy(&ok.stderr).contains("Emitted add_floats.comp"));
    assert!(out.join("add_floats.comp").exists());

    let bad = dir.path().join("bad.h");
    fs::write(&bad, ALLOCATING).unwrap();
    let rejected = tinycompute(&["transpile", bad.to_str().unwrap(), "-o", out_arg]);
    assert_eq!(rejected.status.code(), Some(EXIT_KERNEL_FAILED));
    let stderr = String::from_utf8_lossy(&rejected.stderr);
    assert!(stderr.contains("bad.h("), "{}", stderr);
    assert!(stderr.contains("): error: dynamic allocation with 'new' in a kernel"));
    assert!(!out.join("leaky.comp").exists());

    let missing = dir.path().join("missing.h");
    let fatal = tinycompute(&["transpile", missing.to_str().unwrap(), "-o", out_arg]);
    assert_eq!(fatal.status.code(), Some(EXIT_FATAL));

    let broken = dir.path().join("broken.h");
    fs::write(
        &broken,
        "struct [[clang::annotate(\"kernel\")]] K {\n    void main() { int x = ; }\n};\n",
    )
    .unwrap();
    let parse = tinycompute(&["check", broken.to_str().unwrap()]);
    assert_eq!(parse.status.code(), Some(EXIT_FATAL));
}

#[test]
fn test_cli_bad_config_is_fatal() {
    let (dir, input) = setup(FLOAT_ADDER);
    fs::write(dir.path().join("tinycompute.toml"), "[transpile]\nvalidate = sometimes\n").unwrap();
    let run = tinycompute(&["check", input.to_str().unwrap()]);
    assert_eq!(run.status.code(), Some(EXIT_FATAL));
    assert!(String::from_utf8_lossy(&run.stderr).contains("invalid configuration"));
}

#[test]
fn test_cli_config_sets_output_directory() {
    let (dir, input) = setup(FLOAT_ADDER);
    fs::write(
        dir.path().join("tinycompute.toml"),
        "[transpile]\noutput_dir = \"glsl\"\nextension = \"glsl\"\nversion = \"450\"\n",
    )
    .unwrap();
    let run = tinycompute(&["transpile", input.to_str().unwrap()]);
    assert_eq!(run.status.code(), Some(EXIT_OK));
    let shader = fs::read_to_string(dir.path().join("glsl").join("add_floats.glsl")).unwrap();
    assert!(shader.starts_with("#version 450\n"));
}

#[test]
fn test_cli_kernels_and_manifest() {
    let source = format!("{}\n{}", GAME_OF_LIFE, FLOAT_ADDER);
    let (dir, input) = setup(&source);

    let listing = tinycompute(&["kernels", input.to_str().unwrap(), "--json"]);
    assert_eq!(listing.status.code(), Some(EXIT_OK));
    let json = String::from_utf8_lossy(&listing.stdout);
    assert!(json.contains("\"name\": \"GameOfLifeKernel\""));
    assert!(json.contains("\"file_location\": \"add_floats\""));
    assert_eq!(json.matches("\"shader\": null").count(), 2);

    let manifest = dir.path().join("kernels.json");
    let run = tinycompute(&[
        "transpile",
        input.to_str().unwrap(),
        "-o",
        dir.path().join("out").to_str().unwrap(),
        "--manifest",
        manifest.to_str().unwrap(),
    ]);
    assert_eq!(run.status.code(), Some(EXIT_OK));
    let json = fs::read_to_string(&manifest).unwrap();
    assert!(json.contains("\"shader\": \"gol_v4.comp\""));
    assert!(json.contains("{ \"kind\": \"uniform\", \"name\": \"width\", \"element\": \"int\", \"dim\": null, \"binding\": 1, \"set\": 0 }"));
}
