use std::io::Cursor;
use strata::assets::{Texture, TextureArray};
use strata::error::RenderError;

#[test]
fn rgb_pixels_get_an_opaque_alpha() {
    let texture = Texture::from_pixels(2, 1, 3, &[10, 20, 30, 40, 50, 60]).unwrap();
    assert_eq!(texture.data(), &[10, 20, 30, 255, 40, 50, 60, 255]);
}

#[test]
fn gray_pixels_are_spread_over_rgb() {
    let gray = Texture::from_pixels(2, 1, 1, &[7, 200]).unwrap();
    assert_eq!(gray.data(), &[7, 7, 7, 255, 200, 200, 200, 255]);

    let gray_alpha = Texture::from_pixels(1, 1, 2, &[90, 12]).unwrap();
    assert_eq!(gray_alpha.data(), &[90, 90, 90, 12]);
}

#[test]
fn rgba_pixels_are_kept() {
    let pixels = [1, 2, 3, 4, 5, 6, 7, 8];
    let texture = Texture::from_pixels(1, 2, 4, &pixels).unwrap();

    assert_eq!(texture.data(), &pixels);
    assert_eq!((texture.width(), texture.height()), (1, 2));
}

#[test]
fn channel_count_is_checked() {
    assert!(matches!(
        Texture::from_pixels(1, 1, 5, &[0; 5]),
        Err(RenderError::UnsupportedChannels { channels: 5 })
    ));
    assert!(matches!(
        Texture::from_pixels(1, 1, 0, &[]),
        Err(RenderError::UnsupportedChannels { channels: 0 })
    ));
}

#[test]
fn pixel_data_must_match_the_size() {
    assert!(matches!(
        Texture::from_pixels(2, 2, 3, &[0; 11]),
        Err(RenderError::InvalidTextureData { expected: 12, actual: 11 })
    ));
    assert!(matches!(
        Texture::from_pixels(0, 4, 4, &[]),
        Err(RenderError::InvalidTextureData { expected: 0, actual: 0 })
    ));
}

#[test]
fn same_pixels_hash_the_same() {
    let a = Texture::solid(3, 3, [1, 2, 3, 4]);
    let b = Texture::from_pixels(3, 3, 4, &[1, 2, 3, 4].repeat(9)).unwrap();
    let taller = Texture::solid(1, 9, [1, 2, 3, 4]);

    assert_eq!(a.content_hash(), b.content_hash());
    assert_ne!(a.content_hash(), taller.content_hash());
}

#[test]
fn encoded_images_are_decoded_to_rgba() {
    let image = image::RgbImage::from_pixel(2, 3, image::Rgb([9, 8, 7]));
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let texture = Texture::load_image_from_memory(&png).unwrap();

    assert_eq!((texture.width(), texture.height()), (2, 3));
    assert_eq!(&texture.data()[..4], &[9, 8, 7, 255]);
    assert_eq!(texture.data().len(), 2 * 3 * 4);

    assert!(matches!(
        Texture::load_image_from_memory(b"not an image"),
        Err(RenderError::ImageDecode { .. })
    ));
}

#[test]
fn array_layers_must_match_in_size() {
    let mut array = TextureArray::new(2, 2, 8);

    assert_eq!(array.push_layer(&Texture::solid(2, 2, [0; 4])).unwrap(), 0);
    assert_eq!(array.push_layer(&Texture::solid(2, 2, [1; 4])).unwrap(), 1);
    assert!(matches!(
        array.push_layer(&Texture::solid(4, 2, [0; 4])),
        Err(RenderError::TextureLayerMismatch { width: 4, .. })
    ));

    assert_eq!(array.layers(), 2);
    assert_eq!(array.data().len(), 2 * 2 * 2 * 4);
}

#[test]
fn full_arrays_reject_layers() {
    let mut array = TextureArray::new(1, 1, 2);
    array.push_layer(&Texture::white()).unwrap();
    array.push_layer(&Texture::white()).unwrap();

    assert!(matches!(
        array.push_layer(&Texture::white()),
        Err(RenderError::TextureArrayFull { limit: 2 })
    ));
    assert_eq!(array.layers(), 2);
}

#[test]
fn array_and_plain_texture_hash_differently() {
    assert_ne!(Texture::white().content_hash(), TextureArray::white().content_hash());
}
