use binaural_sound::{
    algebra::Vector3,
    direction::DirectionResolver,
    effects::{reverb::Reverb, Effect},
    listener::Listener,
    occlusion::OcclusionProbe,
    source::SpatialSourceBuilder,
};

const SAMPLE_RATE: u32 = 48000;
const BLOCK_LEN: usize = 512;

fn main() {
    // Small room around the source.
    let mut reverb = Reverb::new(SAMPLE_RATE);
    reverb.set_wet(0.15);

    let mut source = SpatialSourceBuilder::new(SAMPLE_RATE)
        .with_minimum_distance(1.0)
        .with_attenuation_scale(0.05)
        .with_effect(Effect::Reverb(reverb))
        .build()
        .unwrap();
    let controls = source.controls();

    let listener = Listener::new();
    let mut resolver = DirectionResolver::new();
    let probe = OcclusionProbe::default();

    // A thin wall at z = -1 hides the source while it is behind the listener.
    let wall = |origin: Vector3<f32>, direction: Vector3<f32>, max_distance: f32| {
        if direction.z.abs() < f32::EPSILON {
            return false;
        }
        let t = (-1.0 - origin.z) / direction.z;
        t > 0.0 && t * direction.norm() < max_distance
    };

    // Create output wav file.
    let wav_spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut wav_writer = hound::WavWriter::create("orbit.wav", wav_spec).unwrap();

    let mut noise_state = 0x2545_f491_u32;
    let mut block = vec![0.0f32; BLOCK_LEN * 2];
    let mut time = 0.0f32;

    // Source makes two full circles around the listener in 8 seconds.
    while time < 8.0 {
        let angle = time * std::f32::consts::PI * 0.5;
        let position = Vector3::new(3.0 * angle.sin(), 0.5, 3.0 * angle.cos());

        // Frame side: geometry and obstruction.
        let direction = resolver.resolve(&listener, position);
        controls.set_direction(&direction);
        controls.set_occlusion(probe.occlusion(&wall, position, &direction));

        // Audio side: pulsing noise.
        for (i, frame) in block.chunks_exact_mut(2).enumerate() {
            noise_state ^= noise_state << 13;
            noise_state ^= noise_state >> 17;
            noise_state ^= noise_state << 5;
            let t = time + i as f32 / SAMPLE_RATE as f32;
            let envelope = if (t * 4.0).fract() < 0.25 { 0.5 } else { 0.0 };
            let sample = (noise_state as f32 / u32::MAX as f32 * 2.0 - 1.0) * envelope;
            frame[0] = sample;
            frame[1] = sample;
        }
        source.process_interleaved(&mut block, 2);

        for sample in block.iter() {
            wav_writer.write_sample(*sample).unwrap();
        }

        time += BLOCK_LEN as f32 / SAMPLE_RATE as f32;
    }

    wav_writer.finalize().unwrap();
}
