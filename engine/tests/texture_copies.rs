mod common;

use common::*;
use emberline_engine::graphics::gpu::*;
use emberline_engine::graphics::{
    CommandError,
    TextureCopy,
};

const USAGE: TextureUsage = TextureUsage::COPY_SRC
    .union(TextureUsage::COPY_DST)
    .union(TextureUsage::SAMPLED);

fn rows(bytes: &[u8], width: u32) -> Vec<&[u8]> {
    bytes.chunks_exact(width as usize * 4).collect()
}

#[test]
fn copy_1d_texture_into_a_2d_row() {
    let device = device();
    let mut recorder = recorder(&device);
    let line_info = texture_info(TextureDimension::Dim1D, Format::RGBA8UNorm, 64, 1, USAGE);
    let line_data = pattern(64 * 4, 7);
    let line = uploaded_texture(&device, &mut recorder, &line_info, &line_data);
    let image_info = texture_info(TextureDimension::Dim2D, Format::RGBA8UNorm, 64, 16, USAGE);
    let image = uploaded_texture(&device, &mut recorder, &image_info, &vec![0u8; 64 * 16 * 4]);

    recorder.begin().unwrap();
    recorder
        .copy_texture(
            &line,
            &image,
            &TextureCopy {
                dst_offset: Offset3D { x: 0, y: 5, z: 0 },
                ..TextureCopy::whole_texture(Extent3D {
                    width: 64,
                    height: 1,
                    depth: 1,
                })
            },
        )
        .unwrap();
    submit_and_wait(&device, &mut recorder);

    let contents = read_back(&device, &mut recorder, &image);
    for (y, row) in rows(&contents, 64).into_iter().enumerate() {
        if y == 5 {
            assert_eq!(row, &line_data[..]);
        } else {
            assert!(row.iter().all(|byte| *byte == 0), "row {} was modified", y);
        }
    }
    assert_no_violations(&device);
}

#[test]
fn copy_from_a_mip_level() {
    let device = device();
    let mut recorder = recorder(&device);
    let mut mipped_info = texture_info(TextureDimension::Dim2D, Format::RGBA8UNorm, 200, 8, USAGE);
    mipped_info.mip_levels = 2;
    let mipped = device.create_texture(&mipped_info, Some("Mipped")).unwrap();
    let staging = staging_texture(&device, &mipped_info);
    let mip_data = pattern(100 * 4 * 4, 3);
    device.write_texture(&staging, 1, 0, &mip_data).unwrap();

    let mip_extent = Extent3D {
        width: 100,
        height: 4,
        depth: 1,
    };
    let target = device
        .create_texture(
            &texture_info(TextureDimension::Dim2D, Format::RGBA8UNorm, 100, 4, USAGE),
            Some("Target"),
        )
        .unwrap();

    recorder.begin().unwrap();
    recorder
        .copy_texture(
            &staging,
            &mipped,
            &TextureCopy {
                src_mip_level: 1,
                dst_mip_level: 1,
                ..TextureCopy::whole_texture(mip_extent)
            },
        )
        .unwrap();
    recorder
        .copy_texture(
            &mipped,
            &target,
            &TextureCopy {
                src_mip_level: 1,
                ..TextureCopy::whole_texture(mip_extent)
            },
        )
        .unwrap();
    submit_and_wait(&device, &mut recorder);

    assert_eq!(read_back(&device, &mut recorder, &target), mip_data);
    assert_no_violations(&device);
}

#[test]
fn copy_between_offsets() {
    let device = device();
    let mut recorder = recorder(&device);
    let info = texture_info(TextureDimension::Dim2D, Format::RGBA8UNorm, 100, 100, USAGE);
    let src_data = pattern(100 * 100 * 4, 11);
    let src = uploaded_texture(&device, &mut recorder, &info, &src_data);
    let dst = uploaded_texture(&device, &mut recorder, &info, &vec![0u8; 100 * 100 * 4]);

    recorder.begin().unwrap();
    recorder
        .copy_texture(
            &src,
            &dst,
            &TextureCopy {
                src_offset: Offset3D { x: 50, y: 50, z: 0 },
                dst_offset: Offset3D { x: 10, y: 10, z: 0 },
                ..TextureCopy::whole_texture(Extent3D {
                    width: 50,
                    height: 50,
                    depth: 1,
                })
            },
        )
        .unwrap();
    submit_and_wait(&device, &mut recorder);

    let contents = read_back(&device, &mut recorder, &dst);
    let src_rows = rows(&src_data, 100);
    for (y, row) in rows(&contents, 100).into_iter().enumerate() {
        for x in 0..100usize {
            let texel = &row[x * 4..x * 4 + 4];
            if (10..60).contains(&x) && (10..60).contains(&y) {
                let src_x = x - 10 + 50;
                assert_eq!(texel, &src_rows[y - 10 + 50][src_x * 4..src_x * 4 + 4]);
            } else {
                assert_eq!(texel, &[0u8; 4][..], "texel ({}, {}) was modified", x, y);
            }
        }
    }
    assert_no_violations(&device);
}

#[test]
fn staging_to_staging_copy() {
    let device = device();
    let mut recorder = recorder(&device);
    let info = texture_info(TextureDimension::Dim2D, Format::RGBA8UNorm, 16, 16, USAGE);
    let src = staging_texture(&device, &info);
    let dst = staging_texture(&device, &info);
    let data = pattern(16 * 16 * 4, 5);
    device.write_texture(&src, 0, 0, &data).unwrap();

    recorder.begin().unwrap();
    recorder
        .copy_texture(
            &src,
            &dst,
            &TextureCopy::whole_texture(Extent3D {
                width: 16,
                height: 16,
                depth: 1,
            }),
        )
        .unwrap();
    submit_and_wait(&device, &mut recorder);

    assert_eq!(device.read_texture(&dst, 0, 0).unwrap(), data);
    assert_no_violations(&device);
}

#[test]
fn multi_layer_copy_from_staging_is_rejected() {
    let device = device();
    let mut recorder = recorder(&device);
    let mut info = texture_info(TextureDimension::Dim2D, Format::RGBA8UNorm, 8, 8, USAGE);
    info.array_length = 2;
    let staging = staging_texture(&device, &info);
    let array = device.create_texture(&info, Some("Array")).unwrap();

    recorder.begin().unwrap();
    assert_eq!(
        recorder.copy_texture(
            &staging,
            &array,
            &TextureCopy {
                layer_count: 2,
                ..TextureCopy::whole_texture(Extent3D {
                    width: 8,
                    height: 8,
                    depth: 1,
                })
            },
        ),
        Err(CommandError::UnsupportedStagingLayerCopy { layer_count: 2 })
    );
    assert_eq!(recorder.captured_resource_count(), 0);

    // A single layer still goes through.
    recorder
        .copy_texture(
            &staging,
            &array,
            &TextureCopy {
                src_base_array_layer: 1,
                dst_base_array_layer: 1,
                ..TextureCopy::whole_texture(Extent3D {
                    width: 8,
                    height: 8,
                    depth: 1,
                })
            },
        )
        .unwrap();
    assert_eq!(recorder.captured_resource_count(), 2);
    submit_and_wait(&device, &mut recorder);
    assert_no_violations(&device);
}
