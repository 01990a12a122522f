use std::fs::File;
use std::path::{Path, PathBuf};

use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{Block, Linktype, PcapBlockOwned, PcapError, PcapNGReader};
use snifcap_core::{ConversionError, ConvertOptions, Dialect, LinkType, convert_bytes, convert_file};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn fixture(name: &str) -> PathBuf {
    repo_root().join("tests").join("fixtures").join(name)
}

#[derive(Debug, Default)]
struct Capture {
    sections: usize,
    linktypes: Vec<Linktype>,
    packets: Vec<Packet>,
}

#[derive(Debug)]
struct Packet {
    if_id: u32,
    ts_micros: u64,
    data: Vec<u8>,
}

fn read_capture(path: &Path) -> Capture {
    let file = File::open(path).unwrap();
    let mut reader = PcapNGReader::new(65536, file).unwrap();
    let mut capture = Capture::default();
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                match block {
                    PcapBlockOwned::NG(Block::SectionHeader(_)) => capture.sections += 1,
                    PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                        capture.linktypes.push(intf.linktype)
                    }
                    PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                        capture.packets.push(Packet {
                            if_id: epb.if_id,
                            ts_micros: ((epb.ts_high as u64) << 32) | epb.ts_low as u64,
                            data: epb.data[..epb.caplen as usize].to_vec(),
                        })
                    }
                    _ => {}
                }
                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete(_)) => reader.refill().unwrap(),
            Err(err) => panic!("unexpected pcapng error: {err:?}"),
        }
    }
    capture
}

fn hex_bytes(dump: &str, first_line: usize, lines: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    for line in dump.lines().skip(first_line).take(lines) {
        let hex_column = line.split('\t').nth(1).unwrap();
        bytes.extend(hex::decode(hex_column.replace(' ', "")).unwrap());
    }
    bytes
}

#[test]
fn converts_fixture_and_reference_decoder_agrees() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("basic.pcapng");
    let summary = convert_file(
        &fixture("fortigate_basic.txt"),
        &output,
        &ConvertOptions::default(),
    )
    .unwrap();

    assert_eq!(summary.packets_converted, 3);
    assert_eq!(summary.packets_received_by_filter, Some(3));
    assert_eq!(summary.output_files, vec![output.display().to_string()]);
    assert_eq!(summary.skipped_lines, 0);
    let names: Vec<_> = summary.interfaces.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["port1", "port2"]);
    assert_eq!(summary.time_start.as_deref(), Some("2022-08-23T10:11:12.123456Z"));
    assert_eq!(summary.time_end.as_deref(), Some("2022-08-23T10:11:13.000001Z"));

    let capture = read_capture(&output);
    assert_eq!(capture.sections, 1);
    assert_eq!(capture.linktypes, vec![Linktype::ETHERNET, Linktype::ETHERNET]);
    let ids: Vec<_> = capture.packets.iter().map(|p| p.if_id).collect();
    assert_eq!(ids, vec![0, 1, 0]);
    let timestamps: Vec<_> = capture.packets.iter().map(|p| p.ts_micros).collect();
    assert_eq!(
        timestamps,
        vec![1_661_249_472_123_456, 1_661_249_472_500_000, 1_661_249_473_000_001]
    );

    let dump = std::fs::read_to_string(fixture("fortigate_basic.txt")).unwrap();
    assert_eq!(capture.packets[0].data, hex_bytes(&dump, 3, 5));
    assert_eq!(capture.packets[1].data, hex_bytes(&dump, 10, 4));
    assert_eq!(capture.packets[2].data, hex_bytes(&dump, 16, 5));
    assert_eq!(capture.packets[0].data.len(), 74);
    assert_eq!(capture.packets[1].data.len(), 62);
}

#[test]
fn compatible_dialect_reads_tcpdump_style_dump() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("compat.pcapng");
    let summary = convert_file(
        &fixture("compat_tcpdump.txt"),
        &output,
        &ConvertOptions::default(),
    )
    .unwrap();

    assert_eq!(summary.packets_converted, 2);
    let names: Vec<_> = summary.interfaces.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["FPC02/port5", "FPC02/port6"]);

    let capture = read_capture(&output);
    assert_eq!(capture.packets[0].ts_micros, 123_456);
    assert_eq!(capture.packets[1].ts_micros, 1_000_001);
    assert_eq!(capture.packets[0].data.len(), 74);
    assert_eq!(capture.packets[1].data.len(), 62);
    assert_eq!(&capture.packets[1].data[48..], b"p-fixture-udp!".as_slice());
}

#[test]
fn strict_dialect_ignores_tcpdump_style_dump() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("strict.pcapng");
    let options = ConvertOptions {
        dialect: Dialect::Strict,
        ..ConvertOptions::default()
    };
    let summary = convert_file(&fixture("compat_tcpdump.txt"), &output, &options).unwrap();

    assert_eq!(summary.packets_converted, 0);
    let capture = read_capture(&output);
    assert_eq!(capture.sections, 1);
    assert!(capture.packets.is_empty());
}

#[test]
fn splits_output_into_parts() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("split.pcapng");
    let options = ConvertOptions {
        max_packets_per_file: Some(2),
        ..ConvertOptions::default()
    };
    let summary = convert_file(&fixture("fortigate_basic.txt"), &output, &options).unwrap();

    let first = dir.path().join("split.part001.pcapng");
    let second = dir.path().join("split.part002.pcapng");
    assert_eq!(
        summary.output_files,
        vec![first.display().to_string(), second.display().to_string()]
    );
    assert_eq!(summary.output_path, first.display().to_string());
    assert!(!output.exists());

    let first = read_capture(&first);
    let second = read_capture(&second);
    assert_eq!(first.packets.len(), 2);
    assert_eq!(second.packets.len(), 1);
    assert_eq!(second.linktypes.len(), 2);
    assert_eq!(second.packets[0].if_id, 0);
    assert_eq!(second.packets[0].ts_micros, 1_661_249_473_000_001);
}

#[test]
fn section_size_starts_new_sections() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("sections.pcapng");
    let options = ConvertOptions {
        section_size: Some(1),
        ..ConvertOptions::default()
    };
    convert_file(&fixture("fortigate_basic.txt"), &output, &options).unwrap();

    let capture = read_capture(&output);
    assert_eq!(capture.sections, 3);
    assert_eq!(capture.packets.len(), 3);
    // port1, then port1 + port2, then port1 + port2 again
    assert_eq!(capture.linktypes.len(), 5);
}

#[test]
fn interface_filters_skip_and_limit() {
    let dir = tempfile::tempdir().unwrap();

    let mut options = ConvertOptions::default();
    options.exclude.insert("port2".to_string());
    let summary =
        convert_file(&fixture("fortigate_basic.txt"), &dir.path().join("a"), &options).unwrap();
    assert_eq!(summary.packets_converted, 2);
    assert_eq!(summary.packets_filtered, 1);
    assert_eq!(summary.interfaces.len(), 1);

    let mut options = ConvertOptions::default();
    options.include.insert("port2".to_string());
    let summary =
        convert_file(&fixture("fortigate_basic.txt"), &dir.path().join("b"), &options).unwrap();
    assert_eq!(summary.packets_converted, 1);
    assert_eq!(summary.interfaces[0].name, "port2");

    let options = ConvertOptions {
        skip: 1,
        limit: Some(1),
        ..ConvertOptions::default()
    };
    let output = dir.path().join("c");
    let summary = convert_file(&fixture("fortigate_basic.txt"), &output, &options).unwrap();
    assert_eq!(summary.packets_converted, 1);
    assert_eq!(summary.packets_skipped, 1);
    let capture = read_capture(&output);
    assert_eq!(capture.packets[0].ts_micros, 1_661_249_472_500_000);
}

#[test]
fn point_to_point_and_raw_interfaces() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("links.pcapng");
    let mut options = ConvertOptions::default();
    options.link_types.insert("port1".to_string(), LinkType::Null);
    options.link_types.insert("port2".to_string(), LinkType::Raw);
    convert_file(&fixture("fortigate_basic.txt"), &output, &options).unwrap();

    let capture = read_capture(&output);
    assert_eq!(capture.linktypes, vec![Linktype::NULL, Linktype::RAW]);
    assert_eq!(capture.packets[0].data.len(), 64);
    assert_eq!(&capture.packets[0].data[..5], &[0x00, 0x00, 0x08, 0x00, 0x45]);
    assert_eq!(capture.packets[1].data.len(), 62);
}

#[test]
fn incomplete_ipv4_packet_is_dropped_unless_checks_are_off() {
    let dump = "\
1.000000 port1 in 10.0.0.1 -> 10.0.0.2: icmp
0x0000\t 0009 0f09 0004 0050 5694 7b36 0800 4500\t................
0x0010\t 003c 0101 4000 4001 25be 0a00 0001 0a00\t................
";
    let dir = tempfile::tempdir().unwrap();
    let summary =
        convert_bytes(dump.as_bytes(), &dir.path().join("a"), &ConvertOptions::default()).unwrap();
    assert_eq!(summary.packets_converted, 0);
    assert_eq!(summary.packets_incomplete, 1);

    let options = ConvertOptions {
        check_packet_size: false,
        ..ConvertOptions::default()
    };
    let output = dir.path().join("b");
    let summary = convert_bytes(dump.as_bytes(), &output, &options).unwrap();
    assert_eq!(summary.packets_converted, 1);
    assert_eq!(read_capture(&output).packets[0].data.len(), 32);
}

#[test]
fn malformed_line_is_skipped_or_fatal() {
    let dump = "1.0 port1 in x\n0x0000 zz\n2.0 port1 in x\n0x0000 0102 0304\n";
    let dir = tempfile::tempdir().unwrap();

    let summary =
        convert_bytes(dump.as_bytes(), &dir.path().join("a"), &ConvertOptions::default()).unwrap();
    assert_eq!(summary.packets_converted, 1);
    assert_eq!(summary.skipped_lines, 1);

    let options = ConvertOptions {
        stop_on_error: true,
        ..ConvertOptions::default()
    };
    let err = convert_bytes(dump.as_bytes(), &dir.path().join("b"), &options).unwrap_err();
    assert!(err.to_string().contains("line 2"));
    assert!(!err.user_message().contains("line 2"));
}

#[test]
fn refuses_to_overwrite_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("exists.pcapng");
    std::fs::write(&output, b"keep").unwrap();
    let options = ConvertOptions {
        overwrite: false,
        ..ConvertOptions::default()
    };
    let err = convert_file(&fixture("fortigate_basic.txt"), &output, &options).unwrap_err();
    assert!(matches!(err, ConversionError::OutputExists(_)));
    assert_eq!(std::fs::read(&output).unwrap(), b"keep");
}

#[test]
fn refuses_to_overwrite_existing_parts_when_splitting() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("split.pcapng");
    let stale = dir.path().join("split.part002.pcapng");
    std::fs::write(&stale, b"keep").unwrap();
    let options = ConvertOptions {
        overwrite: false,
        max_packets_per_file: Some(2),
        ..ConvertOptions::default()
    };

    let err = convert_file(&fixture("fortigate_basic.txt"), &output, &options).unwrap_err();
    assert!(matches!(err, ConversionError::OutputExists(ref path) if *path == stale));
    assert!(!output.exists());
    assert_eq!(std::fs::read(&stale).unwrap(), b"keep");

    // without splitting the part files are not this conversion's outputs
    let options = ConvertOptions {
        overwrite: false,
        ..ConvertOptions::default()
    };
    convert_file(&fixture("fortigate_basic.txt"), &output, &options).unwrap();
}

#[test]
fn malformed_first_line_does_not_corrupt_previous_packet() {
    let dump = "\
1.0 port1 in x
0x0000 0001 0203
0x0004 0405
2.0 port1 in x
0x0000 zz
0x0004 ffff
";
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("recover.pcapng");
    let options = ConvertOptions {
        check_packet_size: false,
        ..ConvertOptions::default()
    };
    let summary = convert_bytes(dump.as_bytes(), &output, &options).unwrap();

    assert_eq!(summary.packets_converted, 1);
    assert_eq!(summary.skipped_lines, 1);
    assert_eq!(summary.dropped_fragments, 1);
    let capture = read_capture(&output);
    assert_eq!(capture.packets[0].data, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn tcpdump_ascii_column_starting_with_hex_letters() {
    let dump = "\
1.000000 port1 in x
\t0x0000:  6162 6320 6465 662e  abc def.
";
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("ascii.pcapng");
    let options = ConvertOptions {
        stop_on_error: true,
        ..ConvertOptions::default()
    };
    let summary = convert_bytes(dump.as_bytes(), &output, &options).unwrap();

    assert_eq!(summary.packets_converted, 1);
    assert_eq!(read_capture(&output).packets[0].data, b"abc def.".to_vec());
}

#[test]
fn missing_input_is_a_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = convert_file(
        &dir.path().join("missing.txt"),
        &dir.path().join("out.pcapng"),
        &ConvertOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConversionError::Source(_)));
}
