use std::fmt::Write;

use expect_test::{expect, Expect};

use super::*;

fn dump(buf: &[u8]) -> String {
    let mut out = String::new();
    let mut offset = 0;

    while let Some(segment) = scan(buf, offset) {
        write!(
            out,
            "{:04X} [FF {:02X}] {:?} size={}",
            segment.offset(),
            segment.marker().0,
            segment.marker(),
            segment.size(),
        )
        .unwrap();

        if !segment.is_complete() {
            writeln!(out, " incomplete").unwrap();
            break;
        }

        let marker = segment.marker();
        if marker.is_sof() {
            match read_frame_header(&segment) {
                Ok(hdr) => {
                    write!(out, " {}x{} P={}", hdr.X(), hdr.Y(), hdr.P()).unwrap();
                    for c in hdr.components() {
                        write!(out, " {}:{}x{}", c.Ci(), c.Hi(), c.Vi()).unwrap();
                    }
                }
                Err(e) => write!(out, " error: {e}").unwrap(),
            }
        } else if marker == Marker::APP0 {
            match read_density(&segment) {
                Ok(block) => write!(out, " {block:?}").unwrap(),
                Err(e) => write!(out, " error: {e}").unwrap(),
            }
        } else if marker == Marker::APP1 {
            match read_app1(&segment) {
                Ok(app1) => write!(out, " {:?} {:x?}", app1.signature(), app1.data()).unwrap(),
                Err(e) => write!(out, " error: {e}").unwrap(),
            }
        } else if marker == Marker::APP14 {
            match read_adobe(&segment) {
                Ok(adobe) => write!(out, " transform={:?}", adobe.transform()).unwrap(),
                Err(e) => write!(out, " error: {e}").unwrap(),
            }
        } else if marker == Marker::COM {
            write!(out, " \"{}\"", read_com(&segment).escape_ascii()).unwrap();
        }
        writeln!(out).unwrap();

        offset = segment.end();
    }

    out
}

fn check(buf: &[u8], expect: Expect) {
    expect.assert_eq(&dump(buf));
}

#[test]
fn empty() {
    check(&[], expect![[""]]);
    check(&[0xFF], expect![[""]]);
    check(
        &[0xFF, 0xD8 /* SOI */],
        expect![[r#"
            0000 [FF D8] SOI size=2
        "#]],
    );
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xD9, // EOI
        ],
        expect![[r#"
            0000 [FF D8] SOI size=2
            0002 [FF D9] EOI size=2
        "#]],
    );
}

#[test]
fn fill_and_stuffing() {
    check(
        &[
            0x12, 0x34, // garbage
            0xFF, 0xFF, 0xFF, // fill bytes
            0xFF, 0xD8, // SOI
            0xAB, 0xFF, 0x00, 0xCD, // stuffed zero
            0xFF, 0xD3, // RST3
            0xFF, 0x01, // TEM
            0xFF, 0xD9, // EOI
        ],
        expect![[r#"
            0005 [FF D8] SOI size=2
            000B [FF D3] RST3 size=2
            000D [FF 01] TEM size=2
            000F [FF D9] EOI size=2
        "#]],
    );
}

#[test]
fn truncated() {
    // Length field cut off.
    check(
        &[0xFF, 0xD8, 0xFF, 0xC0, 0x00],
        expect![[r#"
            0000 [FF D8] SOI size=2
            0002 [FF C0] SOF0 size=4 incomplete
        "#]],
    );
    // Payload cut off.
    check(
        &[0xFF, 0xD8, 0xFF, 0xFE, 0x00, 0x05, b'h'],
        expect![[r#"
            0000 [FF D8] SOI size=2
            0002 [FF FE] COM size=7 incomplete
        "#]],
    );
}

#[test]
fn invalid_length_is_skipped() {
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xC4, 0x00, 0x01, // DHT with bogus length
            0xFF, 0xD9, // EOI
        ],
        expect![[r#"
            0000 [FF D8] SOI size=2
            0006 [FF D9] EOI size=2
        "#]],
    );
}

#[test]
fn segments() {
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, 0x00, 0x10, // APP0
            b'J', b'F', b'I', b'F', 0x00, // identifier
            0x01, 0x02, // version
            0x01, // unit: dots per inch
            0x00, 0x48, 0x00, 0x48, // density
            0x00, 0x00, // thumbnail
            0xFF, 0xEE, 0x00, 0x0E, // APP14
            b'A', b'd', b'o', b'b', b'e', // identifier
            0x00, 0x64, 0x00, 0x00, 0x00, 0x00, // version, flags
            0x02, // transform
            0xFF, 0xFE, 0x00, 0x04, b'h', b'i', // COM
            0xFF, 0xE1, 0x00, 0x07, // APP1
            b'X', b'Y', 0x00, 0xAA, 0xBB, // signature + data
            0xFF, 0xC0, 0x00, 0x11, // SOF0
            0x08, 0x00, 0x10, 0x00, 0x20, 0x03, // P, Y, X, Nf
            0x01, 0x22, 0x00, // Y
            0x02, 0x11, 0x01, // Cb
            0x03, 0x11, 0x01, // Cr
            0xFF, 0xD9, // EOI
        ],
        expect![[r#"
            0000 [FF D8] SOI size=2
            0002 [FF E0] APP0 size=18 Jfif(Jfif { major_version: 1, minor_version: 2, unit: DotsPerInch, xdensity: 72, ydensity: 72, xthumbnail: 0, ythumbnail: 0 })
            0014 [FF EE] APP14 size=16 transform=Some(2)
            0024 [FF FE] COM size=6 "hi"
            002A [FF E1] APP1 size=9 "XY" [aa, bb]
            0033 [FF C0] SOF0 size=19 32x16 P=8 1:2x2 2:1x1 3:1x1
            0046 [FF D9] EOI size=2
        "#]],
    );
}

#[test]
fn short_segments() {
    check(
        &[
            0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, // APP0
            0xFF, 0xEE, 0x00, 0x0C, // APP14 without room for the transform flags
            b'A', b'd', b'o', b'b', b'e', 0x00, 0x64, 0x00, 0x00, 0x00,
            0xFF, 0xC1, 0x00, 0x0B, // SOF1 declaring 2 components but containing one
            0x08, 0x00, 0x01, 0x00, 0x01, 0x02, 0x01, 0x11, 0x00,
        ],
        expect![[r#"
            0000 [FF E0] APP0 size=6 error: APP0 segment of 4 bytes is too short
            0006 [FF EE] APP14 size=14 error: reached end of segment while decoding JPEG stream
            0014 [FF C1] SOF1 size=13 error: reached end of segment while decoding JPEG stream
        "#]],
    );
}

#[test]
fn adobe_without_transform() {
    let buf = [
        0xFF, 0xEE, 0x00, 0x0D, // APP14
        b'A', b'd', b'o', b'b', b'e', // identifier
        0x00, 0x64, 0x00, 0x00, 0x00, 0x00, // version, flags
    ];
    let segment = scan(&buf, 0).unwrap();
    assert!(segment.is_complete());
    assert_eq!(read_adobe(&segment).unwrap().transform(), None);
}

#[test]
fn density_units() {
    fn jfif(unit: u8, x: u16, y: u16) -> Jfif {
        let mut buf = vec![0xFF, 0xE0, 0x00, 0x10];
        buf.extend_from_slice(b"JFIF\0\x01\x02");
        buf.push(unit);
        buf.extend_from_slice(&x.to_be_bytes());
        buf.extend_from_slice(&y.to_be_bytes());
        buf.extend_from_slice(&[0, 0]);
        match read_density(&scan(&buf, 0).unwrap()).unwrap() {
            DensityBlock::Jfif(jfif) => jfif,
            DensityBlock::Extension => panic!("expected JFIF header"),
        }
    }

    let aspect = jfif(0, 4, 3);
    assert_eq!(aspect.version(), (1, 2));
    assert_eq!(aspect.pixel_aspect_ratio(), Some((4, 3)));
    assert_eq!(aspect.pixels_per_inch(), None);

    let cm = jfif(2, 100, 100);
    assert_eq!(cm.pixel_aspect_ratio(), None);
    assert_eq!(cm.pixels_per_inch(), Some((254.0, 254.0)));

    let unknown = jfif(7, 1, 1);
    assert_eq!(unknown.unit(), DensityUnit::Unknown(7));
    assert_eq!(unknown.pixels_per_inch(), None);
    assert_eq!(unknown.pixel_aspect_ratio(), None);
}

#[test]
fn jfxx() {
    let mut buf = vec![0xFF, 0xE0, 0x00, 0x10];
    buf.extend_from_slice(b"JFXX\0");
    buf.extend_from_slice(&[0x10; 9]);
    let segment = scan(&buf, 0).unwrap();
    assert_eq!(read_density(&segment).unwrap(), DensityBlock::Extension);
}

#[test]
fn marker_names() {
    assert_eq!(format!("{:?}", Marker(0xC2)), "SOF2");
    assert_eq!(format!("{:?}", Marker(0xC8)), "Marker(c8)");
    assert_eq!(format!("{:?}", Marker::APP14), "APP14");
    assert!(!Marker::DHT.is_sof());
    assert!(!Marker::DAC.is_sof());
    assert!(Marker(0xCF).is_sof());
}
